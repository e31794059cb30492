//! Configuration management for the event graph analyzer

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AnalyticsError, Result};
use crate::storage::GraphVariant;

/// Genre labels that are placeholders in the source data rather than real genres
pub const EXCLUDED_GENRE_LABELS: &[&str] = &["Other", "Undefined"];

/// Cities the rebuild produces per-city entries for
pub const DEFAULT_CITIES: &[&str] = &[
    "Las Vegas",
    "New York",
    "Boston",
    "Chicago",
    "Philadelphia",
    "Los Angeles",
    "Atlanta",
    "Washington",
    "Seattle",
    "San Diego",
    "San Francisco",
    "Houston",
    "Dallas",
    "Raleigh",
    "Ft Lauderdale",
    "Indianapolis",
    "Columbus",
    "Detroit",
    "Denver",
    "Nashville",
];

/// Rebuild configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Cities that get their own cache entries (the `all` entry covers their
    /// union); empty means every city in the data
    pub cities: Vec<String>,

    /// Genre names dropped from genre centrality rankings
    pub excluded_genre_labels: Vec<String>,

    /// Seed for Louvain node ordering
    pub louvain_seed: u64,

    /// How many strongest/weakest edges the edge weight summary keeps
    pub extreme_edge_count: usize,

    /// Root directory of the cache store
    pub cache_dir: PathBuf,

    /// Graph variants the rebuild produces
    pub variants: Vec<GraphVariant>,

    /// Percentage under which a genre is folded into "Other" in genre shares
    pub genre_share_threshold: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cities: DEFAULT_CITIES.iter().map(|c| c.to_string()).collect(),
            excluded_genre_labels: EXCLUDED_GENRE_LABELS.iter().map(|l| l.to_string()).collect(),
            louvain_seed: 42,
            extreme_edge_count: 5,
            cache_dir: PathBuf::from("data/cache"),
            variants: GraphVariant::ALL.to_vec(),
            genre_share_threshold: 2.5,
        }
    }
}

impl Config {
    /// Load a configuration from a JSON file; missing fields keep their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::info!("Reading configuration from {}", path.display());

        let text = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&text)?;
        config.validate()?;

        Ok(config)
    }

    /// Reject values the rebuild cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.extreme_edge_count == 0 {
            return Err(AnalyticsError::Config(
                "extreme_edge_count must be at least 1".to_string(),
            ));
        }
        if self.variants.is_empty() {
            return Err(AnalyticsError::Config("no graph variants selected".to_string()));
        }
        if !(0.0..=100.0).contains(&self.genre_share_threshold) {
            return Err(AnalyticsError::Config(format!(
                "genre_share_threshold {} is not a percentage",
                self.genre_share_threshold
            )));
        }
        Ok(())
    }
}
