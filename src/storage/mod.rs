//! Cache of built graphs and their metric artifacts

pub mod key;
pub mod store;

use crate::error::Result;
use crate::graph::EventGraph;
use crate::metrics::{MetricArtifact, MetricKind};

pub use key::{CacheKey, GraphVariant, Scope};
pub use store::{EntryManifest, FsCacheStore};

/// Outcome of a cache read
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup<T> {
    Found(T),
    /// The slice was rebuilt but had no matching records
    NoData,
    /// Nothing has been published under the key
    NotFound,
}

impl<T> CacheLookup<T> {
    pub fn found(self) -> Option<T> {
        match self {
            CacheLookup::Found(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, CacheLookup::Found(_))
    }
}

/// Persistent store of rebuild results.
///
/// Implementations publish each entry as a whole, so an interrupted rebuild
/// never leaves a half-written entry behind. Reads are meant to run between
/// rebuilds; a read racing a republish of the same key may see the key as
/// missing, or pair the old manifest with the new graph.
pub trait CacheStore: Send + Sync {
    /// Publish a graph with its metric artifacts, replacing any previous entry
    fn put(&self, key: &CacheKey, graph: &EventGraph, metrics: &[MetricArtifact]) -> Result<()>;

    /// Publish a marker for a slice that had no records
    fn put_empty(&self, key: &CacheKey) -> Result<()>;

    fn get(&self, key: &CacheKey) -> Result<CacheLookup<EventGraph>>;

    fn get_metrics(&self, key: &CacheKey, kind: MetricKind) -> Result<CacheLookup<MetricArtifact>>;

    /// Every published key, sorted by key string
    fn keys(&self) -> Result<Vec<CacheKey>>;
}
