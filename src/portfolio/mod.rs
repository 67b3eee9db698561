//! # Portfolio Optimization Module
//!
//! Weight solvers operating on annualized expected returns and covariance:
//! - Mean-Variance (Markowitz): long-only, per-asset cap, optional target return
//! - Covariance heuristic: `pinv(Σ)μ` rescaled to a fully invested portfolio
//!
//! ```rust,ignore
//! use portfolio_optimizer::portfolio::{optimizer_for, OptimizerMethod, OptimizationOutcome};
//!
//! let optimizer = optimizer_for("mean_variance".parse()?, &config.optimizer);
//! match optimizer.optimize(&expected, &covariance, None) {
//!     OptimizationOutcome::Solved(weights) => { /* ... */ }
//!     OptimizationOutcome::Failed(reason) => { /* fall back */ }
//! }
//! ```

mod covariance;
mod mean_variance;

pub use covariance::CovarianceOptimizer;
pub use mean_variance::MeanVarianceOptimizer;

use crate::config::OptimizerConfig;
use crate::error::{PortfolioError, Result};
use crate::types::{CovarianceMatrix, ExpectedReturns, WeightVector};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Optimization method to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizerMethod {
    /// Minimum volatility subject to full investment and weight bounds
    MeanVariance,
    /// Inverse-covariance weighting of expected returns
    Covariance,
}

impl OptimizerMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MeanVariance => "mean_variance",
            Self::Covariance => "covariance",
        }
    }
}

impl Default for OptimizerMethod {
    fn default() -> Self {
        Self::MeanVariance
    }
}

impl FromStr for OptimizerMethod {
    type Err = PortfolioError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "mean_variance" => Ok(Self::MeanVariance),
            "covariance" => Ok(Self::Covariance),
            _ => Err(PortfolioError::UnknownOptimizerMethod(s.to_string())),
        }
    }
}

impl fmt::Display for OptimizerMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Result of a solver run; failure carries the reason and is never raised
#[derive(Debug, Clone, PartialEq)]
pub enum OptimizationOutcome {
    Solved(WeightVector),
    Failed(String),
}

impl OptimizationOutcome {
    pub fn is_solved(&self) -> bool {
        matches!(self, Self::Solved(_))
    }
}

/// Weight solver seam
pub trait Optimizer: Send + Sync {
    fn method(&self) -> OptimizerMethod;

    /// Solve for weights indexed like `expected_returns.symbols`
    fn optimize(
        &self,
        expected_returns: &ExpectedReturns,
        covariance: &CovarianceMatrix,
        target_return: Option<f64>,
    ) -> OptimizationOutcome;
}

/// Map a method onto its solver
pub fn optimizer_for(method: OptimizerMethod, config: &OptimizerConfig) -> Box<dyn Optimizer> {
    match method {
        OptimizerMethod::MeanVariance => Box::new(MeanVarianceOptimizer::from_config(config)),
        OptimizerMethod::Covariance => Box::new(CovarianceOptimizer::new()),
    }
}

/// Expected returns and covariance must describe the same assets in the same order
pub fn check_inputs(expected_returns: &ExpectedReturns, covariance: &CovarianceMatrix) -> Result<()> {
    let n = expected_returns.len();
    if n == 0 {
        return Err(PortfolioError::InvalidInput("no assets to optimize".into()));
    }
    if covariance.values.nrows() != n || covariance.values.ncols() != n {
        return Err(PortfolioError::DimensionMismatch {
            expected: format!("{}x{} covariance", n, n),
            actual: format!("{}x{}", covariance.values.nrows(), covariance.values.ncols()),
        });
    }
    if covariance.symbols != expected_returns.symbols {
        return Err(PortfolioError::DimensionMismatch {
            expected: expected_returns.symbols.join(","),
            actual: covariance.symbols.join(","),
        });
    }
    Ok(())
}
