//! Error types for the portfolio pipeline

use crate::data::FetchError;
use thiserror::Error;

/// Errors surfaced by the portfolio pipeline
#[derive(Error, Debug)]
pub enum PortfolioError {
    #[error("Unknown asset type: {0}")]
    UnknownAssetType(String),

    #[error("Invalid asset spec: {0}")]
    InvalidAssetSpec(String),

    #[error("Duplicate symbol in collection: {0}")]
    DuplicateSymbol(String),

    #[error("Unknown optimizer method: {0}")]
    UnknownOptimizerMethod(String),

    #[error("Invalid date range: start {start} must be before end {end}")]
    InvalidDateRange { start: String, end: String },

    #[error("Data unavailable for {symbol}: {source}")]
    DataUnavailable {
        symbol: String,
        #[source]
        source: FetchError,
    },

    #[error("No price series fetched for any asset")]
    NoPriceData,

    #[error("Insufficient data: need at least {required} observations, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: String, actual: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Pipeline exceeded its time budget of {0}s")]
    PipelineTimeout(u64),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, PortfolioError>;
