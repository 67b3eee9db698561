//! Portfolio return series

use nalgebra::DMatrix;

pub struct ReturnCalculator;

impl ReturnCalculator {
    /// Weighted sum across assets for every period: `Σᵢ wᵢ rᵢ,ₜ`
    pub fn portfolio_returns(daily: &DMatrix<f64>, weights: &[f64]) -> Vec<f64> {
        daily
            .row_iter()
            .map(|row| row.iter().zip(weights).map(|(r, w)| r * w).sum())
            .collect()
    }

    /// Compounded growth `Π(1 + rₜ) - 1`
    pub fn cumulative(returns: &[f64]) -> f64 {
        returns.iter().fold(1.0, |acc, r| acc * (1.0 + r)) - 1.0
    }
}
