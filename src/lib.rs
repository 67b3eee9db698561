//! Multi-Asset Portfolio Optimizer
//!
//! Builds a portfolio from a heterogeneous list of stocks, ETFs, crypto pairs
//! and bonds, fetches their price history, and chooses weights.
//!
//! ## Architecture
//!
//! ```text
//! AssetRegistry → PriceDataProvider (Yahoo / Binance / FRED) → align
//!       → ReturnsEstimator → Optimizer (mean-variance | covariance)
//!       → PortfolioAnalyzer → PortfolioReport
//! ```

pub mod analysis;
pub mod assets;
pub mod client;
pub mod config;
pub mod data;
pub mod error;
pub mod estimator;
pub mod pipeline;
pub mod portfolio;
pub mod types;

#[cfg(test)]
mod types_tests;
#[cfg(test)]
mod config_tests;
