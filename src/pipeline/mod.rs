//! End-to-end portfolio run
//!
//! ```text
//! specs → AssetCollection → PriceDataProvider → PriceMatrix
//!       → ReturnsEstimator → Optimizer (equal-weight fallback)
//!       → PortfolioAnalyzer → PortfolioReport
//! ```
//!
//! Everything a run needs travels in a [`PortfolioRequest`]; the manager holds
//! no per-run state.


use crate::analysis::{AssetVolatility, PortfolioAnalyzer};
use crate::assets::{AssetCollection, AssetDescription, AssetRegistry, AssetSpec};
use crate::config::{Config, OptimizerConfig};
use crate::data::{DroppedSymbol, FetchReport, PriceDataProvider};
use crate::error::{PortfolioError, Result};
use crate::estimator::{ReturnEstimates, ReturnsEstimator};
use crate::portfolio::{check_inputs, optimizer_for, OptimizationOutcome, OptimizerMethod};
use crate::types::{
    AllocationRow, AnalysisResult, DateRange, DisplayMetrics, ExpectedReturns, PriceMatrix,
    WeightVector,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Inputs of a single run
#[derive(Debug, Clone)]
pub struct PortfolioRequest {
    pub specs: Vec<AssetSpec>,
    pub range: DateRange,
    pub method: OptimizerMethod,
    pub target_return: Option<f64>,
    /// Annual, as a fraction
    pub risk_free_rate: f64,
}

impl PortfolioRequest {
    pub fn new(specs: Vec<AssetSpec>, range: DateRange) -> Self {
        Self {
            specs,
            range,
            method: OptimizerMethod::default(),
            target_return: None,
            risk_free_rate: 0.02,
        }
    }

    pub fn with_method(mut self, method: OptimizerMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_target_return(mut self, target: Option<f64>) -> Self {
        self.target_return = target;
        self
    }

    pub fn with_risk_free_rate(mut self, rate: f64) -> Self {
        self.risk_free_rate = rate;
        self
    }
}

/// Weights after the fallback policy has been applied
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizedWeights {
    pub weights: WeightVector,
    /// Solver failure that triggered the equal-weight fallback
    pub fallback_reason: Option<String>,
}

/// Serializable outcome of a run
#[derive(Debug, Clone, Serialize)]
pub struct PortfolioReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub range: DateRange,
    pub method: OptimizerMethod,
    pub target_return: Option<f64>,
    pub risk_free_rate: f64,
    pub assets: Vec<AssetDescription>,
    pub dropped: Vec<DroppedSymbol>,
    pub used_fallback: bool,
    pub fallback_reason: Option<String>,
    pub weights: WeightVector,
    pub allocation: Vec<AllocationRow>,
    pub metrics: AnalysisResult,
    pub display: DisplayMetrics,
    pub asset_volatilities: Vec<AssetVolatility>,
    pub observations: usize,
}

/// CPU-bound stages, computed off the async runtime
struct Computed {
    optimized: OptimizedWeights,
    allocation: Vec<AllocationRow>,
    metrics: AnalysisResult,
    asset_volatilities: Vec<AssetVolatility>,
}

pub struct PortfolioManager {
    provider: Arc<PriceDataProvider>,
    config: Config,
}

impl PortfolioManager {
    pub fn new(provider: Arc<PriceDataProvider>, config: Config) -> Self {
        Self { provider, config }
    }

    /// Manager backed by the HTTP price sources named in `config.data`
    pub fn from_config(config: Config) -> Result<Self> {
        let provider = PriceDataProvider::from_config(&config.data)?;
        Ok(Self::new(Arc::new(provider), config))
    }

    /// Validate specs and build the asset collection; performs no I/O
    pub fn build_collection(&self, specs: &[AssetSpec]) -> Result<AssetCollection> {
        let collection = AssetRegistry::build_collection(specs)?;
        if collection.is_empty() {
            return Err(PortfolioError::InvalidInput("no assets requested".into()));
        }
        Ok(collection)
    }

    pub async fn fetch_prices(&self, collection: &AssetCollection, range: &DateRange) -> Result<FetchReport> {
        self.provider.fetch_all(collection, range).await
    }

    /// Run the whole pipeline under the configured wall-clock cap
    pub async fn run(&self, request: PortfolioRequest) -> Result<PortfolioReport> {
        let budget = self.config.pipeline.run_timeout();
        match tokio::time::timeout(budget, self.execute(request)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Run exceeded {:?}, aborting", budget);
                Err(PortfolioError::PipelineTimeout(budget.as_secs()))
            }
        }
    }

    async fn execute(&self, request: PortfolioRequest) -> Result<PortfolioReport> {
        let run_id = Uuid::new_v4();
        let analyzer = PortfolioAnalyzer::new(request.risk_free_rate)?;
        let collection = self.build_collection(&request.specs)?;

        info!(
            "Run {}: {} assets, method {}, {} to {}",
            run_id,
            collection.len(),
            request.method,
            request.range.start(),
            request.range.end()
        );

        let FetchReport { prices, dropped } = self.fetch_prices(&collection, &request.range).await?;

        let optimizer_config = self.config.optimizer.clone();
        let method = request.method;
        let target_return = request.target_return;
        let (prices, computed) = tokio::task::spawn_blocking(move || {
            let computed = compute(&prices, &optimizer_config, &analyzer, method, target_return);
            (prices, computed)
        })
        .await
        .map_err(|e| PortfolioError::Internal(format!("compute task failed: {}", e)))?;
        let computed = computed?;

        info!(
            "Run {} complete: return {:.2}%, vol {:.2}%, sharpe {:.3}{}",
            run_id,
            computed.metrics.cumulative_return * 100.0,
            computed.metrics.volatility * 100.0,
            computed.metrics.sharpe_ratio,
            if computed.optimized.fallback_reason.is_some() { " (equal-weight fallback)" } else { "" }
        );

        Ok(PortfolioReport {
            run_id,
            generated_at: Utc::now(),
            range: request.range,
            method,
            target_return,
            risk_free_rate: request.risk_free_rate,
            assets: collection.describe(),
            dropped,
            used_fallback: computed.optimized.fallback_reason.is_some(),
            fallback_reason: computed.optimized.fallback_reason,
            display: computed.metrics.display(),
            weights: computed.optimized.weights,
            allocation: computed.allocation,
            metrics: computed.metrics,
            asset_volatilities: computed.asset_volatilities,
            observations: prices.n_dates(),
        })
    }
}

fn compute(
    prices: &PriceMatrix,
    optimizer_config: &OptimizerConfig,
    analyzer: &PortfolioAnalyzer,
    method: OptimizerMethod,
    target_return: Option<f64>,
) -> Result<Computed> {
    let estimates = ReturnsEstimator::new().estimate(prices)?;
    let optimized = optimize_with_fallback(optimizer_config, &estimates, method, target_return)?;
    let allocation = allocation_table(&optimized.weights, &estimates.expected_returns);
    let report = analyzer.report(prices, &optimized.weights)?;

    Ok(Computed {
        optimized,
        allocation,
        metrics: report.metrics,
        asset_volatilities: report.asset_volatilities,
    })
}

/// Solve, fall back to `1/n` when the solver gives up, then re-normalize
pub fn optimize_with_fallback(
    config: &OptimizerConfig,
    estimates: &ReturnEstimates,
    method: OptimizerMethod,
    target_return: Option<f64>,
) -> Result<OptimizedWeights> {
    check_inputs(&estimates.expected_returns, &estimates.covariance)?;

    if target_return.is_some() && method == OptimizerMethod::Covariance {
        debug!("Target return is ignored by the covariance optimizer");
    }

    let optimizer = optimizer_for(method, config);
    let (weights, fallback_reason) =
        match optimizer.optimize(&estimates.expected_returns, &estimates.covariance, target_return) {
            OptimizationOutcome::Solved(weights) => (weights, None),
            OptimizationOutcome::Failed(reason) => {
                warn!("{} optimizer failed ({}), using equal weights", method, reason);
                let symbols = estimates.expected_returns.symbols.clone();
                (WeightVector::equal(symbols), Some(reason))
            }
        };

    Ok(OptimizedWeights {
        weights: weights.normalized()?,
        fallback_reason,
    })
}

/// Weight, expected return and contribution per symbol, in weight order
pub fn allocation_table(weights: &WeightVector, expected_returns: &ExpectedReturns) -> Vec<AllocationRow> {
    weights
        .iter()
        .map(|(symbol, weight)| {
            let expected_return = expected_returns.get(symbol).unwrap_or(0.0);
            AllocationRow {
                symbol: symbol.to_string(),
                weight,
                expected_return,
                contribution: weight * expected_return,
            }
        })
        .collect()
}
