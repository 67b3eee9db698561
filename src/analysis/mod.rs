//! Realized performance analysis
//!
//! Applies a weight vector to historical prices:
//! - Daily portfolio returns and compounded cumulative return
//! - Annualized portfolio and per-asset volatility
//! - Sharpe ratio against a configurable risk-free rate

pub mod returns;
pub mod volatility;


pub use returns::ReturnCalculator;
pub use volatility::VolatilityCalculator;

use crate::error::{PortfolioError, Result};
use crate::estimator::daily_returns;
use crate::types::{AnalysisResult, PriceMatrix, WeightVector, TRADING_DAYS};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Annualized volatility of a single asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetVolatility {
    pub symbol: String,
    pub volatility: f64,
}

/// Full analysis of one weighted portfolio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    pub metrics: AnalysisResult,
    pub asset_volatilities: Vec<AssetVolatility>,
}

#[derive(Debug, Clone)]
pub struct PortfolioAnalyzer {
    risk_free_rate: f64,
}

impl PortfolioAnalyzer {
    pub fn new(risk_free_rate: f64) -> Result<Self> {
        if !risk_free_rate.is_finite() || risk_free_rate < 0.0 {
            return Err(PortfolioError::InvalidInput(format!(
                "risk-free rate must be a non-negative fraction, got {}",
                risk_free_rate
            )));
        }
        Ok(Self { risk_free_rate })
    }

    /// Cumulative return, annualized volatility and Sharpe ratio
    pub fn analyze(&self, prices: &PriceMatrix, weights: &WeightVector) -> Result<AnalysisResult> {
        Ok(self.report(prices, weights)?.metrics)
    }

    /// Portfolio metrics plus the volatility of every asset
    pub fn report(&self, prices: &PriceMatrix, weights: &WeightVector) -> Result<PerformanceReport> {
        if weights.symbols() != prices.symbols() {
            return Err(PortfolioError::DimensionMismatch {
                expected: prices.symbols().join(","),
                actual: weights.symbols().join(","),
            });
        }

        let daily = daily_returns(prices)?;
        let portfolio = ReturnCalculator::portfolio_returns(&daily.values, weights.values());
        let cumulative_return = ReturnCalculator::cumulative(&portfolio);
        let volatility = VolatilityCalculator::portfolio(&daily.values, weights.values());

        let mean_daily = if portfolio.is_empty() {
            0.0
        } else {
            portfolio.iter().sum::<f64>() / portfolio.len() as f64
        };
        let sharpe_ratio = sharpe(mean_daily * TRADING_DAYS, volatility, self.risk_free_rate);

        let asset_volatilities = daily
            .symbols
            .iter()
            .zip(VolatilityCalculator::per_asset(&daily.values))
            .map(|(symbol, volatility)| AssetVolatility {
                symbol: symbol.clone(),
                volatility,
            })
            .collect();

        debug!(
            "Analyzed {} periods: return {:.4}, vol {:.4}, sharpe {:.3}",
            daily.n_periods(),
            cumulative_return,
            volatility,
            sharpe_ratio
        );

        Ok(PerformanceReport {
            metrics: AnalysisResult {
                cumulative_return,
                volatility,
                sharpe_ratio,
            },
            asset_volatilities,
        })
    }
}

/// Excess annual return per unit of volatility; zero when volatility is zero
pub fn sharpe(annual_return: f64, volatility: f64, risk_free_rate: f64) -> f64 {
    if volatility == 0.0 {
        0.0
    } else {
        (annual_return - risk_free_rate) / volatility
    }
}
