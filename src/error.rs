//! Error types shared by the loader, builders, metrics and cache store

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    /// Nothing has been published for the requested key or artifact
    #[error("not found: {0}")]
    NotFound(String),

    /// The requested slice has zero matching records
    #[error("no records for {0}")]
    EmptyInput(String),

    /// A source row is missing a required field
    #[error("malformed record at row {row}: missing {field}")]
    MalformedRecord { row: usize, field: &'static str },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("bincode error: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;
