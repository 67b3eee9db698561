//! Annualized volatility from daily returns

use crate::estimator::sample_covariance;
use crate::types::TRADING_DAYS;
use nalgebra::{DMatrix, DVector};

pub struct VolatilityCalculator;

impl VolatilityCalculator {
    /// `sqrt(wᵀ Cov(daily) w) · sqrt(252)`
    pub fn portfolio(daily: &DMatrix<f64>, weights: &[f64]) -> f64 {
        let cov = sample_covariance(daily);
        let w = DVector::from_column_slice(weights);
        let variance = w.dot(&(&cov * &w));
        // tiny negative values are rounding noise
        variance.max(0.0).sqrt() * TRADING_DAYS.sqrt()
    }

    /// Sample standard deviation of each column, annualized
    pub fn per_asset(daily: &DMatrix<f64>) -> Vec<f64> {
        let cov = sample_covariance(daily);
        cov.diagonal()
            .iter()
            .map(|v| v.max(0.0).sqrt() * TRADING_DAYS.sqrt())
            .collect()
    }
}
