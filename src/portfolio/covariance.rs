//! Inverse-covariance weighting

use super::{OptimizationOutcome, Optimizer, OptimizerMethod};
use crate::types::{CovarianceMatrix, ExpectedReturns, WeightVector};
use tracing::warn;

/// Singular values below this are treated as zero by the pseudo-inverse
const PINV_EPS: f64 = 1e-12;

/// `w ∝ pinv(Σ)μ`, rescaled to sum to one. Unbounded, so short positions
/// and leverage are possible. The target return is ignored.
#[derive(Debug, Clone, Default)]
pub struct CovarianceOptimizer;

impl CovarianceOptimizer {
    pub fn new() -> Self {
        Self
    }
}

impl Optimizer for CovarianceOptimizer {
    fn method(&self) -> OptimizerMethod {
        OptimizerMethod::Covariance
    }

    fn optimize(
        &self,
        expected_returns: &ExpectedReturns,
        covariance: &CovarianceMatrix,
        _target_return: Option<f64>,
    ) -> OptimizationOutcome {
        let inverse = match covariance.values.clone().pseudo_inverse(PINV_EPS) {
            Ok(inverse) => inverse,
            Err(e) => return OptimizationOutcome::Failed(format!("pseudo-inverse failed: {}", e)),
        };

        let raw = inverse * &expected_returns.values;
        let sum = raw.sum();
        if !sum.is_finite() || sum.abs() < f64::EPSILON {
            let reason = format!("inverse-covariance weights sum to {}", sum);
            warn!("Covariance optimization failed: {}", reason);
            return OptimizationOutcome::Failed(reason);
        }

        let values = raw.iter().map(|w| w / sum).collect();
        match WeightVector::new(expected_returns.symbols.clone(), values) {
            Ok(weights) => OptimizationOutcome::Solved(weights),
            Err(e) => OptimizationOutcome::Failed(e.to_string()),
        }
    }
}
