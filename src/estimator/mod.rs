//! # Returns Estimator
//!
//! Turns an aligned [`PriceMatrix`] into the inputs of the optimizer:
//! annualized mean returns and an annualized sample covariance with a small
//! ridge on the diagonal so the matrix stays positive definite.

use crate::error::{PortfolioError, Result};
use crate::types::{CovarianceMatrix, ExpectedReturns, PriceMatrix, ReturnsMatrix, TRADING_DAYS};
use nalgebra::{DMatrix, DVector};
use tracing::debug;

/// Added to the covariance diagonal after annualization
pub const RIDGE: f64 = 1e-6;

/// Minimum daily returns for a sample covariance
const MIN_PERIODS: usize = 2;

/// Estimator output for one price matrix
#[derive(Debug, Clone)]
pub struct ReturnEstimates {
    pub expected_returns: ExpectedReturns,
    pub covariance: CovarianceMatrix,
    pub daily_returns: ReturnsMatrix,
}

/// Annualized moments estimator
#[derive(Debug, Clone)]
pub struct ReturnsEstimator {
    annualization: f64,
    ridge: f64,
}

impl Default for ReturnsEstimator {
    fn default() -> Self {
        Self {
            annualization: TRADING_DAYS,
            ridge: RIDGE,
        }
    }
}

impl ReturnsEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expected returns (mean x 252), covariance (sample cov x 252 + ridge I)
    /// and the daily returns they were computed from
    pub fn estimate(&self, prices: &PriceMatrix) -> Result<ReturnEstimates> {
        let daily = daily_returns(prices)?;
        let n_periods = daily.n_periods();
        if n_periods < MIN_PERIODS {
            return Err(PortfolioError::InsufficientData {
                required: MIN_PERIODS + 1,
                actual: prices.n_dates(),
            });
        }

        let means = column_means(&daily.values);
        let n = means.len();

        let mut covariance = sample_covariance(&daily.values) * self.annualization;
        for i in 0..n {
            covariance[(i, i)] += self.ridge;
        }

        debug!("Estimated moments for {} assets over {} periods", n, n_periods);

        Ok(ReturnEstimates {
            expected_returns: ExpectedReturns {
                symbols: daily.symbols.clone(),
                values: means * self.annualization,
            },
            covariance: CovarianceMatrix {
                symbols: daily.symbols.clone(),
                values: covariance,
            },
            daily_returns: daily,
        })
    }
}

/// Percentage change of each column, first row dropped
pub fn daily_returns(prices: &PriceMatrix) -> Result<ReturnsMatrix> {
    if prices.n_dates() < 2 {
        return Err(PortfolioError::InsufficientData {
            required: 2,
            actual: prices.n_dates(),
        });
    }

    let p = prices.values();
    let values = DMatrix::from_fn(p.nrows() - 1, p.ncols(), |i, j| p[(i + 1, j)] / p[(i, j)] - 1.0);

    Ok(ReturnsMatrix {
        symbols: prices.symbols().to_vec(),
        dates: prices.dates()[1..].to_vec(),
        values,
    })
}

pub(crate) fn column_means(values: &DMatrix<f64>) -> DVector<f64> {
    let rows = values.nrows().max(1) as f64;
    DVector::from_iterator(values.ncols(), values.column_iter().map(|c| c.sum() / rows))
}

/// Sample covariance of the columns with an `n - 1` denominator
pub(crate) fn sample_covariance(values: &DMatrix<f64>) -> DMatrix<f64> {
    let n = values.nrows();
    let k = values.ncols();
    if n < 2 {
        return DMatrix::zeros(k, k);
    }

    let means = column_means(values);
    let mut centered = values.clone();
    for (j, mut column) in centered.column_iter_mut().enumerate() {
        column.add_scalar_mut(-means[j]);
    }

    let mut covariance = centered.transpose() * &centered / (n as f64 - 1.0);
    // floating point can leave the two halves a few ulps apart
    for i in 0..k {
        for j in (i + 1)..k {
            let avg = 0.5 * (covariance[(i, j)] + covariance[(j, i)]);
            covariance[(i, j)] = avg;
            covariance[(j, i)] = avg;
        }
    }
    covariance
}
