//! Rebuild pass: builds, measures and publishes every cache entry

use std::collections::HashMap;

use itertools::Itertools;
use rayon::prelude::*;
use serde::Serialize;

use crate::config::Config;
use crate::data::loader::LoadedEvents;
use crate::data::preprocessing::{distinct_cities, distinct_segments, select, within_cities};
use crate::data::{EventField, EventRecord};
use crate::error::{AnalyticsError, Result};
use crate::graph::{
    build_bipartite_graph, build_cooccurrence_graph, subgraph_by_city, CooccurrenceMode,
    EventGraph, NodeRole,
};
use crate::metrics::{
    degree_centrality, detect_communities, edge_weight_extremes, find_bridge_nodes,
    genre_centrality, weighted_clustering, MetricArtifact, MetricKind,
};
use crate::storage::{CacheKey, CacheStore, GraphVariant, Scope};

/// A key whose rebuild failed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyFailure {
    pub key: String,
    pub error: String,
}

/// Outcome counts of a rebuild pass
#[derive(Debug, Clone, Default, Serialize)]
pub struct RebuildReport {
    /// Entries published with a graph
    pub built: usize,
    /// Entries published as no-data markers
    pub empty: usize,
    pub failures: Vec<KeyFailure>,
    /// Source rows the loader skipped
    pub malformed_rows: usize,
}

impl RebuildReport {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn total(&self) -> usize {
        self.built + self.empty + self.failed()
    }
}

enum Outcome {
    Built,
    Empty,
}

/// Rebuild every configured entry, or only the entries of `only_city`.
///
/// With no configured cities, every city present in the records gets its
/// own entries. The `all` entries cover only the selected cities, so the
/// `all` venue graphs hold no venue from elsewhere and their degree
/// centrality is normalised over that smaller node count; the dashboard
/// this replaces kept every venue as a node and only limited the edges.
///
/// Keys are processed in parallel on the current rayon pool. A failing key
/// is logged and reported; it never stops the others.
pub fn rebuild<S>(events: &LoadedEvents, config: &Config, store: &S, only_city: Option<&str>) -> RebuildReport
where
    S: CacheStore + ?Sized,
{
    let cities: Vec<String> = match only_city {
        Some(city) => vec![city.to_string()],
        None if config.cities.is_empty() => distinct_cities(&events.records),
        None => config.cities.clone(),
    };
    let records = within_cities(&events.records, &cities);
    let variants: Vec<GraphVariant> = config.variants.iter().copied().unique().collect();

    log::info!(
        "Rebuilding {} variants from {} records in {} cities",
        variants.len(),
        records.len(),
        cities.len()
    );

    // Venue variants derive every city entry from one graph
    let venue_graphs: HashMap<GraphVariant, EventGraph> = variants
        .iter()
        .filter(|v| !v.is_segmented())
        .map(|&v| (v, build_variant_graph(v, &records)))
        .collect();

    let keys = plan_keys(&records, &variants, &cities, only_city.is_none());
    log::info!("Processing {} cache keys", keys.len());

    let outcomes: Vec<(CacheKey, Result<Outcome>)> = keys
        .into_par_iter()
        .map(|key| {
            let outcome = run_job(&key, &records, &venue_graphs, config, store);
            (key, outcome)
        })
        .collect();

    let mut report = RebuildReport {
        malformed_rows: events.malformed,
        ..Default::default()
    };
    for (key, outcome) in outcomes {
        match outcome {
            Ok(Outcome::Built) => report.built += 1,
            Ok(Outcome::Empty) => report.empty += 1,
            Err(err) => {
                log::warn!("Rebuild of {} failed: {}", key, err);
                report.failures.push(KeyFailure {
                    key: key.to_string(),
                    error: err.to_string(),
                });
            }
        }
    }

    log::info!(
        "Rebuild finished: {} built, {} empty, {} failed, {} malformed rows skipped",
        report.built,
        report.empty,
        report.failed(),
        report.malformed_rows
    );
    report
}

/// Keys a rebuild over `records` publishes.
///
/// Venue variants only get the `all` segment; bipartite variants get `all`
/// plus every segment present in the records. The `all` city is left out
/// when `include_all` is false.
pub fn plan_keys(
    records: &[&EventRecord],
    variants: &[GraphVariant],
    cities: &[String],
    include_all: bool,
) -> Vec<CacheKey> {
    let mut city_scopes = Vec::with_capacity(cities.len() + 1);
    if include_all {
        city_scopes.push(Scope::All);
    }
    city_scopes.extend(cities.iter().map(Scope::named));

    let segments: Vec<Scope> = std::iter::once(Scope::All)
        .chain(distinct_segments(records.iter().copied()).into_iter().map(Scope::Named))
        .collect();

    let mut keys = Vec::new();
    for &variant in variants {
        for city in &city_scopes {
            if variant.is_segmented() {
                for segment in &segments {
                    keys.push(CacheKey::new(city.clone(), segment.clone(), variant));
                }
            } else {
                keys.push(CacheKey::new(city.clone(), Scope::All, variant));
            }
        }
    }
    keys
}

/// Graph of `variant` over `records`, before any city or segment filtering
pub fn build_variant_graph(variant: GraphVariant, records: &[&EventRecord]) -> EventGraph {
    let records = records.iter().copied();
    match variant {
        GraphVariant::VenueSharedGenre => build_cooccurrence_graph(
            records,
            EventField::Venue,
            EventField::Genre,
            CooccurrenceMode::PerSharedLabel,
        ),
        GraphVariant::VenueGenreOverlap => build_cooccurrence_graph(
            records,
            EventField::Venue,
            EventField::Genre,
            CooccurrenceMode::Weighted,
        ),
        GraphVariant::ArtistGenre => {
            build_bipartite_graph(records, EventField::Artist, EventField::Genre)
        }
        GraphVariant::VenueGenre => {
            build_bipartite_graph(records, EventField::Venue, EventField::Genre)
        }
    }
}

/// Compute one metric artifact with the configured parameters
pub fn compute_metric(kind: MetricKind, graph: &EventGraph, config: &Config) -> MetricArtifact {
    match kind {
        MetricKind::DegreeCentrality => MetricArtifact::DegreeCentrality(degree_centrality(graph)),
        MetricKind::Clustering => MetricArtifact::Clustering(weighted_clustering(graph)),
        MetricKind::EdgeWeights => {
            MetricArtifact::EdgeWeights(edge_weight_extremes(graph, config.extreme_edge_count))
        }
        MetricKind::Communities => {
            MetricArtifact::Communities(detect_communities(graph, config.louvain_seed))
        }
        MetricKind::GenreCentrality => MetricArtifact::GenreCentrality(genre_centrality(
            graph,
            &config.excluded_genre_labels,
        )),
        MetricKind::BridgeNodes => {
            MetricArtifact::BridgeNodes(find_bridge_nodes(graph, NodeRole::Genre, NodeRole::Artist))
        }
    }
}

fn run_job<S>(
    key: &CacheKey,
    records: &[&EventRecord],
    venue_graphs: &HashMap<GraphVariant, EventGraph>,
    config: &Config,
    store: &S,
) -> Result<Outcome>
where
    S: CacheStore + ?Sized,
{
    let graph = match key_graph(key, records, venue_graphs) {
        Ok(graph) => graph,
        Err(AnalyticsError::EmptyInput(what)) => {
            log::debug!("No records for {}", what);
            store.put_empty(key)?;
            return Ok(Outcome::Empty);
        }
        Err(err) => return Err(err),
    };

    let metrics: Vec<MetricArtifact> = key
        .variant
        .metric_kinds()
        .iter()
        .map(|&kind| compute_metric(kind, &graph, config))
        .collect();

    store.put(key, &graph, &metrics)?;
    log::debug!(
        "Published {} with {} nodes, {} edges and {} metrics",
        key,
        graph.node_count(),
        graph.edge_count(),
        metrics.len()
    );
    Ok(Outcome::Built)
}

/// Graph for one key; `EmptyInput` when the slice has nothing to show
fn key_graph(
    key: &CacheKey,
    records: &[&EventRecord],
    venue_graphs: &HashMap<GraphVariant, EventGraph>,
) -> Result<EventGraph> {
    let empty = || AnalyticsError::EmptyInput(key.to_string());

    let graph = if key.variant.is_segmented() {
        let slice = select(records.iter().copied(), &key.city, &key.segment);
        build_variant_graph(key.variant, &slice)
    } else {
        let base = venue_graphs
            .get(&key.variant)
            .ok_or_else(|| AnalyticsError::NotFound(format!("{} graph", key.variant)))?;
        match &key.city {
            Scope::All => base.clone(),
            Scope::Named(city) => subgraph_by_city(base, city).ok_or_else(empty)?,
        }
    };

    if graph.is_empty() {
        return Err(empty());
    }
    Ok(graph)
}
