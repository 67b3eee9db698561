//! Long-only minimum-volatility program solved with Clarabel

use super::{OptimizationOutcome, Optimizer, OptimizerMethod};
use crate::config::OptimizerConfig;
use crate::types::{CovarianceMatrix, ExpectedReturns, WeightVector};
use clarabel::algebra::CscMatrix;
use clarabel::solver::{DefaultSettingsBuilder, DefaultSolver, IPSolver, SolverStatus, SupportedConeT};
use nalgebra::DMatrix;
use tracing::{debug, warn};

/// Minimize `sqrt(wᵀΣw)` subject to `Σw = 1`, `0 ≤ wᵢ ≤ max_weight` and
/// optionally `wᵀμ = target`.
///
/// The square root is monotone, so the solver works on the variance
/// `½ wᵀ(2Σ)w` which is a convex QP.
#[derive(Debug, Clone)]
pub struct MeanVarianceOptimizer {
    max_weight: f64,
    max_iterations: u32,
    time_limit_secs: f64,
}

impl Default for MeanVarianceOptimizer {
    fn default() -> Self {
        Self::from_config(&OptimizerConfig::default())
    }
}

impl MeanVarianceOptimizer {
    pub fn from_config(config: &OptimizerConfig) -> Self {
        Self {
            max_weight: config.max_weight,
            max_iterations: config.max_iterations,
            time_limit_secs: config.time_limit_secs,
        }
    }

    fn solve(&self, mu: &[f64], sigma: &DMatrix<f64>, target: Option<f64>) -> Result<Vec<f64>, String> {
        let n = mu.len();
        let p = quadratic_term(sigma);
        let q = vec![0.0; n];

        let eq_rows = if target.is_some() { 2 } else { 1 };
        let (a, b) = constraint_rows(mu, target, self.max_weight);
        let cones = [
            SupportedConeT::ZeroConeT(eq_rows),
            SupportedConeT::NonnegativeConeT(2 * n),
        ];

        let settings = DefaultSettingsBuilder::default()
            .verbose(false)
            .max_iter(self.max_iterations)
            .time_limit(self.time_limit_secs)
            .build()
            .map_err(|e| format!("invalid solver settings: {}", e))?;

        let mut solver = DefaultSolver::new(&p, &q, &a, &b, &cones, settings);
        solver.solve();

        let status = solver.solution.status;
        debug!(
            "Clarabel finished: {:?} after {} iterations",
            status, solver.info.iterations
        );
        if status != SolverStatus::Solved {
            return Err(format!("solver status {:?}", status));
        }
        if solver.solution.x.iter().any(|w| !w.is_finite()) {
            return Err("solver returned non-finite weights".into());
        }

        // interior-point iterates may sit a hair outside the box
        Ok(solver
            .solution
            .x
            .iter()
            .map(|w| w.clamp(0.0, self.max_weight))
            .collect())
    }
}

impl Optimizer for MeanVarianceOptimizer {
    fn method(&self) -> OptimizerMethod {
        OptimizerMethod::MeanVariance
    }

    fn optimize(
        &self,
        expected_returns: &ExpectedReturns,
        covariance: &CovarianceMatrix,
        target_return: Option<f64>,
    ) -> OptimizationOutcome {
        let n = expected_returns.len();
        if n == 0 {
            return OptimizationOutcome::Failed("no assets".into());
        }
        if (n as f64) * self.max_weight < 1.0 - 1e-12 {
            let reason = format!(
                "infeasible: {} assets capped at {} cannot sum to 1",
                n, self.max_weight
            );
            warn!("Mean-variance {}", reason);
            return OptimizationOutcome::Failed(reason);
        }

        let mu: Vec<f64> = expected_returns.values.iter().copied().collect();
        match self.solve(&mu, &covariance.values, target_return) {
            Ok(values) => match WeightVector::new(expected_returns.symbols.clone(), values) {
                Ok(weights) => OptimizationOutcome::Solved(weights),
                Err(e) => OptimizationOutcome::Failed(e.to_string()),
            },
            Err(reason) => {
                warn!("Mean-variance optimization failed: {}", reason);
                OptimizationOutcome::Failed(reason)
            }
        }
    }
}

/// Upper triangle of `2Σ` in compressed sparse column form
fn quadratic_term(sigma: &DMatrix<f64>) -> CscMatrix<f64> {
    let n = sigma.nrows();
    let mut colptr = Vec::with_capacity(n + 1);
    let mut rowval = Vec::new();
    let mut nzval = Vec::new();

    colptr.push(0);
    for j in 0..n {
        for i in 0..=j {
            rowval.push(i);
            nzval.push(2.0 * sigma[(i, j)]);
        }
        colptr.push(rowval.len());
    }
    CscMatrix::new(n, n, colptr, rowval, nzval)
}

/// `Ax + s = b` rows: budget, optional return target (zero cone), then
/// `-w ≤ 0` and `w ≤ max_weight` (nonnegative cone)
fn constraint_rows(mu: &[f64], target: Option<f64>, max_weight: f64) -> (CscMatrix<f64>, Vec<f64>) {
    let n = mu.len();
    let eq_rows = if target.is_some() { 2 } else { 1 };
    let m = eq_rows + 2 * n;

    let mut colptr = Vec::with_capacity(n + 1);
    let mut rowval = Vec::new();
    let mut nzval = Vec::new();

    colptr.push(0);
    for (j, &mu_j) in mu.iter().enumerate() {
        rowval.push(0);
        nzval.push(1.0);
        if target.is_some() {
            rowval.push(1);
            nzval.push(mu_j);
        }
        rowval.push(eq_rows + j);
        nzval.push(-1.0);
        rowval.push(eq_rows + n + j);
        nzval.push(1.0);
        colptr.push(rowval.len());
    }

    let mut b = Vec::with_capacity(m);
    b.push(1.0);
    if let Some(t) = target {
        b.push(t);
    }
    b.extend(std::iter::repeat(0.0).take(n));
    b.extend(std::iter::repeat(max_weight).take(n));

    (CscMatrix::new(m, n, colptr, rowval, nzval), b)
}
