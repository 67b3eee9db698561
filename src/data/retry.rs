//! Timeout and bounded retry around a single price request

use super::{FetchError, PriceSource};
use crate::types::{DateRange, PriceSeries};
use rand::Rng;
use std::time::Duration;
use tracing::{debug, warn};

/// Exponential backoff with jitter for transient fetch failures
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Attempts after the first one
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Delay before retry number `attempt` (0-based): `base * 2^attempt`,
    /// capped, plus up to 50% jitter
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.max_delay);
        let jitter_cap = (exp.as_millis() / 2) as u64;
        let jitter = if jitter_cap == 0 {
            0
        } else {
            rand::rng().random_range(0..=jitter_cap)
        };
        exp + Duration::from_millis(jitter)
    }
}

/// Fetch with a per-attempt timeout, retrying only transient failures
pub async fn fetch_with_retry(
    source: &dyn PriceSource,
    symbol: &str,
    range: &DateRange,
    timeout: Duration,
    policy: &RetryPolicy,
) -> Result<PriceSeries, FetchError> {
    let mut attempt = 0u32;
    loop {
        let result = match tokio::time::timeout(timeout, source.fetch(symbol, range)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(timeout.as_millis() as u64)),
        };

        match result {
            Ok(series) => {
                debug!("{}: {} prices from {}", symbol, series.len(), source.name());
                return Ok(series);
            }
            Err(e) if e.is_transient() && attempt < policy.max_retries => {
                let mut delay = policy.delay_for(attempt);
                if let FetchError::RateLimited {
                    retry_after_secs: Some(secs),
                } = &e
                {
                    delay = delay.max(Duration::from_secs(*secs).min(policy.max_delay));
                }
                attempt += 1;
                warn!(
                    "{} fetch of {} failed ({}), retry {}/{} in {:?}",
                    source.name(),
                    symbol,
                    e,
                    attempt,
                    policy.max_retries,
                    delay
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}
