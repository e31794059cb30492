//! Core library of the event graph analyzer: builds venue, artist and genre
//! graphs from live-event listings, computes their metrics and caches the
//! results per city, segment and graph variant

pub mod config;
pub mod data;
pub mod error;
pub mod export;
pub mod graph;
pub mod insights;
pub mod metrics;
pub mod pipeline;
pub mod storage;

pub use config::Config;
pub use error::{AnalyticsError, Result};
pub use graph::{EventGraph, Node, NodeRole};
pub use pipeline::{rebuild, RebuildReport};
pub use storage::{CacheKey, CacheLookup, CacheStore, FsCacheStore, GraphVariant, Scope};
