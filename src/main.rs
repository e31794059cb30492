use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use serde_json::{json, to_string_pretty};

use event_graph_analyzer::data::loader::load_events;
use event_graph_analyzer::export::{write_graphml, write_node_csv};
use event_graph_analyzer::insights::{
    average_price_per_sub_genre, event_counts_by_state, genre_share, mean_prices_per_genre,
    price_range_per_genre, top_attractions,
};
use event_graph_analyzer::metrics::{MetricArtifact, MetricKind};
use event_graph_analyzer::{rebuild, CacheKey, CacheLookup, CacheStore, Config, FsCacheStore, GraphVariant, Scope};

#[derive(Parser, Debug)]
#[clap(
    name = "event-graph-analyzer",
    about = "Graph analytics of live-event listings: venues, artists and genres"
)]
struct Cli {
    /// JSON configuration file; missing fields keep their defaults
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    /// Cache directory (overrides the configuration)
    #[clap(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// Verbose logging
    #[clap(long, short, global = true)]
    verbose: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build every graph variant and publish it with its metrics
    Rebuild {
        /// Path to the events file (CSV or Parquet)
        #[clap(long)]
        input: PathBuf,

        /// Only rebuild the entries of this city
        #[clap(long)]
        city: Option<String>,

        /// Number of worker threads (0 = use all available cores)
        #[clap(long, default_value = "0")]
        threads: usize,
    },

    /// Print a cached entry, or one of its metrics, as JSON
    Inspect {
        #[clap(long, value_enum)]
        variant: GraphVariant,

        #[clap(long, default_value = "all")]
        city: String,

        #[clap(long, default_value = "all")]
        segment: String,

        #[clap(long, value_enum)]
        metric: Option<MetricKind>,
    },

    /// Write a cached graph as GraphML and a node CSV
    Export {
        #[clap(long, value_enum)]
        variant: GraphVariant,

        #[clap(long, default_value = "all")]
        city: String,

        #[clap(long, default_value = "all")]
        segment: String,

        /// Output directory
        #[clap(long)]
        output: PathBuf,
    },

    /// Aggregate the raw events of a segment
    Insights {
        #[clap(long)]
        input: PathBuf,

        #[clap(long)]
        segment: String,

        #[clap(long, default_value = "all")]
        city: String,

        /// Restrict top attractions and state counts to one genre
        #[clap(long, default_value = "all")]
        genre: String,

        /// Number of top attractions to list
        #[clap(long, default_value = "10")]
        top: usize,
    },
}

fn main() -> Result<()> {
    let args = Cli::parse();

    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp_millis()
        .init();

    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(dir) = args.cache_dir {
        config.cache_dir = dir;
    }

    match args.command {
        Command::Rebuild { input, city, threads } => {
            let num_threads = if threads > 0 { threads } else { num_cpus::get() };
            log::info!("Using {} worker threads", num_threads);
            rayon::ThreadPoolBuilder::new()
                .num_threads(num_threads)
                .build_global()?;

            log::info!("Input: {}", input.display());
            log::info!("Cache: {}", config.cache_dir.display());

            let events = load_events(&input)?;
            let store = FsCacheStore::open(&config.cache_dir)?;
            let report = rebuild(&events, &config, &store, city.as_deref());

            println!("{}", to_string_pretty(&report)?);
        }

        Command::Inspect { variant, city, segment, metric } => {
            let store = FsCacheStore::open(&config.cache_dir)?;
            let key = CacheKey::new(Scope::parse(&city), Scope::parse(&segment), variant);

            let output = match metric {
                Some(kind) => match store.get_metrics(&key, kind)? {
                    CacheLookup::Found(artifact) => serde_json::to_value(&artifact)?,
                    CacheLookup::NoData => json!({ "key": key.to_string(), "no_data": true }),
                    CacheLookup::NotFound => return Err(anyhow!("no {} metric for {}", kind, key)),
                },
                None => match store.manifest(&key)? {
                    Some(manifest) => serde_json::to_value(&manifest)?,
                    None => return Err(anyhow!("nothing published for {}", key)),
                },
            };

            println!("{}", to_string_pretty(&output)?);
        }

        Command::Export { variant, city, segment, output } => {
            let store = FsCacheStore::open(&config.cache_dir)?;
            let key = CacheKey::new(Scope::parse(&city), Scope::parse(&segment), variant);

            let graph = match store.get(&key)? {
                CacheLookup::Found(graph) => graph,
                CacheLookup::NoData => return Err(anyhow!("{} has no data to export", key)),
                CacheLookup::NotFound => return Err(anyhow!("nothing published for {}", key)),
            };
            let partition = match store.get_metrics(&key, MetricKind::Communities)?.found() {
                Some(MetricArtifact::Communities(partition)) => Some(partition),
                _ => None,
            };

            fs::create_dir_all(&output)?;
            let graphml_path = output.join("graph.graphml");
            let csv_path = output.join("nodes.csv");
            write_graphml(&graph, partition.as_ref(), BufWriter::new(File::create(&graphml_path)?))?;
            write_node_csv(&graph, partition.as_ref(), BufWriter::new(File::create(&csv_path)?))?;

            log::info!(
                "Exported {} to {} and {}",
                key,
                graphml_path.display(),
                csv_path.display()
            );
        }

        Command::Insights { input, segment, city, genre, top } => {
            let events = load_events(&input)?;
            let records = &events.records;
            let city = Scope::parse(&city);
            let genre = Scope::parse(&genre);
            let segment_scope = Scope::named(segment.as_str());

            let output = json!({
                "segment": segment,
                "city": city.to_string(),
                "top_attractions": top_attractions(records, &segment, &genre, top),
                "price_range_per_genre": price_range_per_genre(records, &segment, &city),
                "mean_prices_per_genre": mean_prices_per_genre(records, &segment, &city),
                "genre_share": genre_share(records, &segment, &city, config.genre_share_threshold),
                "events_by_state": {
                    "all_segments": event_counts_by_state(records, &Scope::All, &Scope::All),
                    "segment": event_counts_by_state(records, &segment_scope, &Scope::All),
                    "genre": event_counts_by_state(records, &segment_scope, &genre),
                },
                "sub_genre_prices": average_price_per_sub_genre(records, &segment_scope),
            });

            println!("{}", to_string_pretty(&output)?);
        }
    }

    Ok(())
}
