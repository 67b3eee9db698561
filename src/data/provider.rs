//! Asset-class routing and concurrent fan-out over price sources

use super::{align_series, fetch_with_retry, FetchError, PriceSource, RetryPolicy};
use crate::assets::{Asset, AssetCollection, AssetType};
use crate::client::{BinanceClient, FredClient, YahooClient};
use crate::config::DataConfig;
use crate::error::{PortfolioError, Result};
use crate::types::{DateRange, PriceMatrix, PriceSeries};
use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Request behaviour shared by every source
#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
    pub max_concurrent: usize,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
            max_concurrent: 4,
        }
    }
}

impl From<&DataConfig> for FetchSettings {
    fn from(config: &DataConfig) -> Self {
        Self {
            request_timeout: config.request_timeout(),
            retry: RetryPolicy {
                max_retries: config.max_retries,
                base_delay: Duration::from_millis(config.retry_backoff_ms),
                ..Default::default()
            },
            max_concurrent: config.max_concurrent_fetches.max(1),
        }
    }
}

/// A symbol left out of the run and the reason
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DroppedSymbol {
    pub symbol: String,
    pub reason: String,
}

/// Aligned prices plus the symbols that could not be fetched
#[derive(Debug, Clone)]
pub struct FetchReport {
    pub prices: PriceMatrix,
    pub dropped: Vec<DroppedSymbol>,
}

/// Routes each asset class to its backing source
pub struct PriceDataProvider {
    equity: Arc<dyn PriceSource>,
    crypto: Arc<dyn PriceSource>,
    macro_source: Arc<dyn PriceSource>,
    settings: FetchSettings,
}

impl PriceDataProvider {
    pub fn new(
        equity: Arc<dyn PriceSource>,
        crypto: Arc<dyn PriceSource>,
        macro_source: Arc<dyn PriceSource>,
        settings: FetchSettings,
    ) -> Self {
        Self {
            equity,
            crypto,
            macro_source,
            settings,
        }
    }

    /// Yahoo for stocks and ETFs, Binance for crypto, FRED for bonds
    pub fn from_config(config: &DataConfig) -> Result<Self> {
        Ok(Self::new(
            Arc::new(YahooClient::new(&config.yahoo_url, &config.user_agent)?),
            Arc::new(BinanceClient::new(&config.binance_url, &config.user_agent)?),
            Arc::new(FredClient::new(&config.fred_url, &config.user_agent)?),
            FetchSettings::from(config),
        ))
    }

    pub fn source_for(&self, asset_type: AssetType) -> &dyn PriceSource {
        match asset_type {
            AssetType::Stock | AssetType::Etf => self.equity.as_ref(),
            AssetType::Crypto => self.crypto.as_ref(),
            AssetType::Bond => self.macro_source.as_ref(),
        }
    }

    /// Fetch one asset's history; any failure becomes `DataUnavailable`
    pub async fn fetch(&self, asset: &Asset, range: &DateRange) -> Result<PriceSeries> {
        let source = self.source_for(asset.asset_type());
        let symbol = asset.symbol();

        let series = fetch_with_retry(
            source,
            symbol,
            range,
            self.settings.request_timeout,
            &self.settings.retry,
        )
        .await
        .and_then(|s| if s.is_empty() { Err(FetchError::Empty) } else { Ok(s) })
        .map_err(|source| PortfolioError::DataUnavailable {
            symbol: symbol.to_string(),
            source,
        })?;

        if series.symbol() != symbol {
            return Ok(series.renamed(symbol));
        }
        Ok(series)
    }

    /// Fetch every asset concurrently, drop the failures and align the rest.
    ///
    /// Fails with `NoPriceData` only when no asset yields a series. Column
    /// order of the result follows collection order.
    pub async fn fetch_all(
        &self,
        collection: &AssetCollection,
        range: &DateRange,
    ) -> Result<FetchReport> {
        info!(
            "Fetching {} assets from {} to {}",
            collection.len(),
            range.start(),
            range.end()
        );

        let results: Vec<Result<PriceSeries>> = stream::iter(collection.assets())
            .map(|asset| self.fetch(asset, range))
            .buffered(self.settings.max_concurrent.max(1))
            .collect()
            .await;

        let mut series = Vec::with_capacity(results.len());
        let mut dropped = Vec::new();
        for result in results {
            match result {
                Ok(s) => series.push(s),
                Err(PortfolioError::DataUnavailable { symbol, source }) => {
                    warn!("Dropping {} from run: {}", symbol, source);
                    dropped.push(DroppedSymbol {
                        symbol,
                        reason: source.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        if series.is_empty() {
            return Err(PortfolioError::NoPriceData);
        }

        let prices = align_series(&series)?;
        info!(
            "Aligned {} assets over {} dates ({} dropped)",
            prices.n_assets(),
            prices.n_dates(),
            dropped.len()
        );

        Ok(FetchReport { prices, dropped })
    }
}
