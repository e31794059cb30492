use std::fs;
use std::io;
use std::path::Path;

use event_graph_analyzer::data::loader::load_events;
use event_graph_analyzer::data::EventRecord;
use event_graph_analyzer::graph::EventGraph;
use event_graph_analyzer::metrics::{MetricArtifact, MetricKind};
use event_graph_analyzer::pipeline::build_variant_graph;
use event_graph_analyzer::{
    rebuild, AnalyticsError, CacheKey, CacheLookup, CacheStore, Config, FsCacheStore,
    GraphVariant, Result, Scope,
};

const HEADER: &str = "event_name,attraction_name,venue_id,venue_name,venue_city,venue_state,\
venue_latitude,venue_longitude,segment_name,genre_name,sub_genre_name,start_date,min_price,max_price";

const ROWS: &[&str] = &[
    "Show 1,The Band,v1,Paradise,Boston,MA,42.35,-71.12,Music,Rock,Alternative,2024-05-01,25.0,60.0",
    "Show 2,The Band,v2,Roadrunner,Boston,MA,42.36,-71.14,Music,Jazz,Bebop,2024-05-02,30.0,90.0",
    "Show 3,Quartet,v2,Roadrunner,Boston,MA,42.36,-71.14,Music,Rock,Indie,2024-05-03,20.0,45.0",
    "Game 1,Avalanche,v3,Ball Arena,Denver,CO,39.74,-105.0,Sports,Hockey,NHL,2024-05-04,80.0,400.0",
    "Show 4,Quartet,v4,Ogden,Denver,CO,39.74,-104.97,Music,Rock,Indie,2024-05-05,,",
    "Show 5,Solo,v5,Mohawk,Austin,TX,30.27,-97.74,Music,Rock,Punk,2024-05-06,15.0,30.0",
    "Broken,Nobody,v6,Nowhere,Boston,MA,,,Music,,,2024-05-07,,",
];

fn write_events(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("events.csv");
    let mut text = String::from(HEADER);
    for row in ROWS {
        text.push('\n');
        text.push_str(row);
    }
    text.push('\n');
    fs::write(&path, text).unwrap();
    path
}

fn config(cache_dir: &Path) -> Config {
    Config {
        cities: vec!["Boston".to_string(), "Denver".to_string()],
        cache_dir: cache_dir.to_path_buf(),
        ..Config::default()
    }
}

fn key(city: Scope, segment: Scope, variant: GraphVariant) -> CacheKey {
    CacheKey::new(city, segment, variant)
}

#[test]
fn rebuild_then_read_matches_direct_build() {
    let dir = tempfile::tempdir().unwrap();
    let events = load_events(write_events(dir.path())).unwrap();
    assert_eq!(events.records.len(), 6);
    assert_eq!(events.malformed, 1);

    let config = config(&dir.path().join("cache"));
    let store = FsCacheStore::open(&config.cache_dir).unwrap();
    let report = rebuild(&events, &config, &store, None);

    assert!(report.failures.is_empty());
    assert_eq!(report.malformed_rows, 1);

    let in_cities: Vec<&EventRecord> = events
        .records
        .iter()
        .filter(|r| config.cities.contains(&r.venue_city))
        .collect();
    for variant in [GraphVariant::VenueGenreOverlap, GraphVariant::VenueSharedGenre] {
        let expected = build_variant_graph(variant, &in_cities);
        let cached = store.get(&key(Scope::All, Scope::All, variant)).unwrap();
        assert_eq!(cached, CacheLookup::Found(expected));
    }

    let overlap = key(Scope::All, Scope::All, GraphVariant::VenueGenreOverlap);
    match store.get_metrics(&overlap, MetricKind::EdgeWeights).unwrap() {
        CacheLookup::Found(MetricArtifact::EdgeWeights(summary)) => {
            // v1, v2 and v4 share Rock; v2 also has Jazz but nobody else does
            assert_eq!(summary.edges.len(), 3);
            assert!(summary.edges.iter().all(|e| e.weight == 1.0));
        }
        other => panic!("unexpected edge weights lookup: {:?}", other),
    }
}

#[test]
fn missing_keys_and_empty_slices_are_distinguished() {
    let dir = tempfile::tempdir().unwrap();
    let events = load_events(write_events(dir.path())).unwrap();
    let config = config(&dir.path().join("cache"));
    let store = FsCacheStore::open(&config.cache_dir).unwrap();
    rebuild(&events, &config, &store, None);

    // Boston has no sports events at all
    let boston_sports = key(Scope::named("Boston"), Scope::named("Sports"), GraphVariant::ArtistGenre);
    assert_eq!(store.get(&boston_sports).unwrap(), CacheLookup::NoData);

    let austin = key(Scope::named("Austin"), Scope::All, GraphVariant::VenueGenre);
    assert_eq!(store.get(&austin).unwrap(), CacheLookup::NotFound);

    let denver_sports = key(Scope::named("Denver"), Scope::named("Sports"), GraphVariant::ArtistGenre);
    let graph = store.get(&denver_sports).unwrap().found().unwrap();
    assert_eq!(graph.node_count(), 2);
    assert!(graph.node_by_key("Avalanche").is_some());
}

#[test]
fn city_rebuild_leaves_other_cities_alone() {
    let dir = tempfile::tempdir().unwrap();
    let events = load_events(write_events(dir.path())).unwrap();
    let config = config(&dir.path().join("cache"));
    let store = FsCacheStore::open(&config.cache_dir).unwrap();

    let report = rebuild(&events, &config, &store, Some("Denver"));
    assert!(report.failures.is_empty());
    assert!(report.built > 0);

    let keys = store.keys().unwrap();
    assert!(!keys.is_empty());
    assert!(keys.iter().all(|k| k.city == Scope::named("Denver")));
}

/// Store that refuses to publish anything for one city
struct FailingStore {
    inner: FsCacheStore,
    city: Scope,
}

impl FailingStore {
    fn check(&self, key: &CacheKey) -> Result<()> {
        if key.city == self.city {
            return Err(AnalyticsError::Io(io::Error::new(io::ErrorKind::Other, "disk full")));
        }
        Ok(())
    }
}

impl CacheStore for FailingStore {
    fn put(&self, key: &CacheKey, graph: &EventGraph, metrics: &[MetricArtifact]) -> Result<()> {
        self.check(key)?;
        self.inner.put(key, graph, metrics)
    }

    fn put_empty(&self, key: &CacheKey) -> Result<()> {
        self.check(key)?;
        self.inner.put_empty(key)
    }

    fn get(&self, key: &CacheKey) -> Result<CacheLookup<EventGraph>> {
        self.inner.get(key)
    }

    fn get_metrics(&self, key: &CacheKey, kind: MetricKind) -> Result<CacheLookup<MetricArtifact>> {
        self.inner.get_metrics(key, kind)
    }

    fn keys(&self) -> Result<Vec<CacheKey>> {
        self.inner.keys()
    }
}

#[test]
fn a_failing_key_does_not_stop_the_others() {
    let dir = tempfile::tempdir().unwrap();
    let events = load_events(write_events(dir.path())).unwrap();
    let config = config(&dir.path().join("cache"));
    let store = FailingStore {
        inner: FsCacheStore::open(&config.cache_dir).unwrap(),
        city: Scope::named("Boston"),
    };

    let report = rebuild(&events, &config, &store, None);

    // 2 venue variants x 3 cities + 2 bipartite variants x 3 cities x 3 segments
    assert_eq!(report.total(), 24);
    // every Boston key: 2 venue entries + 2 x 3 bipartite entries
    assert_eq!(report.failed(), 8);
    assert!(report.failures.iter().all(|f| f.key.contains("/boston/")));
    assert!(report.failures[0].error.contains("disk full"));

    let denver = key(Scope::named("Denver"), Scope::All, GraphVariant::VenueGenreOverlap);
    assert!(store.get(&denver).unwrap().is_found());
    let boston = key(Scope::named("Boston"), Scope::All, GraphVariant::VenueGenreOverlap);
    assert_eq!(store.get(&boston).unwrap(), CacheLookup::NotFound);
}
