//! Historical price retrieval and alignment
//!
//! Each asset class is served by one [`PriceSource`]. The
//! [`PriceDataProvider`] routes assets to their source, bounds every request
//! with a timeout, retries transient failures, fans out concurrently and
//! finally aligns the surviving series into a single [`PriceMatrix`].
//!
//! [`PriceMatrix`]: crate::types::PriceMatrix

mod align;
mod provider;
mod retry;

pub use align::align_series;
pub use provider::{DroppedSymbol, FetchReport, FetchSettings, PriceDataProvider};
pub use retry::{fetch_with_retry, RetryPolicy};

use crate::client::HTTP_TIMEOUT;
use crate::types::{DateRange, PriceSeries};
use async_trait::async_trait;
use thiserror::Error;

/// Why a single price fetch failed
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out after {0}ms")]
    Timeout(u64),

    #[error("rate limited by source")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("symbol not found: {0}")]
    NotFound(String),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("source returned no prices in range")]
    Empty,
}

impl FetchError {
    /// Worth another attempt: the same request may succeed later
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) | Self::RateLimited { .. } => true,
            Self::Http { status, .. } => *status >= 500,
            Self::NotFound(_) | Self::Malformed(_) | Self::Empty => false,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout(HTTP_TIMEOUT.as_millis() as u64)
        } else if e.is_decode() {
            FetchError::Malformed(e.to_string())
        } else if e.is_connect() {
            FetchError::Network("connection failed".into())
        } else {
            FetchError::Network(e.to_string())
        }
    }
}

/// A historical price backend for one asset class
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Source name for logging
    fn name(&self) -> &'static str;

    /// Daily prices for `symbol` with dates in `[range.start, range.end)`.
    ///
    /// The returned series is non-empty, chronologically ordered and carries
    /// `symbol` as its identity. Implementations do not retry.
    async fn fetch(&self, symbol: &str, range: &DateRange) -> Result<PriceSeries, FetchError>;
}
