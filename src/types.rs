//! Core data types shared by every pipeline stage

use crate::error::{PortfolioError, Result};
use chrono::NaiveDate;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

/// Trading days per year used to annualize daily statistics
pub const TRADING_DAYS: f64 = 252.0;

/// Tolerance for the sum-to-one check on weight vectors
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Half-open calendar window `[start, end)` for price history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDateRange")]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

#[derive(Deserialize)]
struct RawDateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl TryFrom<RawDateRange> for DateRange {
    type Error = PortfolioError;

    fn try_from(raw: RawDateRange) -> Result<Self> {
        Self::new(raw.start, raw.end)
    }
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start >= end {
            return Err(PortfolioError::InvalidDateRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// Parse from `YYYY-MM-DD` strings
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        let parse = |s: &str| {
            NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .map_err(|e| PortfolioError::InvalidInput(format!("bad date '{}': {}", s, e)))
        };
        Self::new(parse(start)?, parse(end)?)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date < self.end
    }
}

/// Chronological price history for a single symbol
///
/// Every value is finite and strictly positive and there is at most one
/// observation per date.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    symbol: String,
    points: Vec<(NaiveDate, f64)>,
}

impl PriceSeries {
    /// Build a series from raw observations, sorting by date and dropping
    /// missing or non-positive prices. Later duplicates of a date win.
    ///
    /// Returns `None` when nothing usable is left.
    pub fn from_observations<I>(symbol: impl Into<String>, observations: I) -> Option<Self>
    where
        I: IntoIterator<Item = (NaiveDate, f64)>,
    {
        let mut points: Vec<(NaiveDate, f64)> = observations
            .into_iter()
            .filter(|(_, p)| p.is_finite() && *p > 0.0)
            .collect();
        if points.is_empty() {
            return None;
        }

        points.sort_by_key(|(d, _)| *d);
        let mut deduped: Vec<(NaiveDate, f64)> = Vec::with_capacity(points.len());
        for (date, price) in points {
            match deduped.last_mut() {
                Some(last) if last.0 == date => last.1 = price,
                _ => deduped.push((date, price)),
            }
        }

        Some(Self {
            symbol: symbol.into(),
            points: deduped,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Same observations under another identity
    pub fn renamed(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = symbol.into();
        self
    }

    pub fn points(&self) -> &[(NaiveDate, f64)] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|(d, _)| *d)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|(d, _)| *d)
    }
}

/// Aligned prices: one row per date, one column per symbol
#[derive(Debug, Clone, PartialEq)]
pub struct PriceMatrix {
    symbols: Vec<String>,
    dates: Vec<NaiveDate>,
    values: DMatrix<f64>,
}

impl PriceMatrix {
    /// Construct from already-aligned rows `[date][asset]`
    pub fn from_rows(symbols: Vec<String>, dates: Vec<NaiveDate>, rows: &[Vec<f64>]) -> Result<Self> {
        if rows.len() != dates.len() {
            return Err(PortfolioError::DimensionMismatch {
                expected: format!("{} rows", dates.len()),
                actual: format!("{} rows", rows.len()),
            });
        }
        if dates.windows(2).any(|w| w[0] >= w[1]) {
            return Err(PortfolioError::InvalidInput(
                "price matrix dates must be strictly increasing".into(),
            ));
        }
        for row in rows {
            if row.len() != symbols.len() {
                return Err(PortfolioError::DimensionMismatch {
                    expected: format!("{} columns", symbols.len()),
                    actual: format!("{} columns", row.len()),
                });
            }
            if row.iter().any(|p| !p.is_finite()) {
                return Err(PortfolioError::InvalidInput(
                    "price matrix contains missing values".into(),
                ));
            }
        }

        let values = DMatrix::from_fn(dates.len(), symbols.len(), |i, j| rows[i][j]);
        Ok(Self {
            symbols,
            dates,
            values,
        })
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn values(&self) -> &DMatrix<f64> {
        &self.values
    }

    pub fn n_assets(&self) -> usize {
        self.symbols.len()
    }

    pub fn n_dates(&self) -> usize {
        self.dates.len()
    }

    /// Price history of one symbol, in date order
    pub fn column(&self, symbol: &str) -> Option<Vec<f64>> {
        let j = self.symbols.iter().position(|s| s == symbol)?;
        Some(self.values.column(j).iter().copied().collect())
    }
}

/// Period-over-period percentage changes, rows are dates after the first
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnsMatrix {
    pub symbols: Vec<String>,
    pub dates: Vec<NaiveDate>,
    pub values: DMatrix<f64>,
}

impl ReturnsMatrix {
    pub fn n_periods(&self) -> usize {
        self.values.nrows()
    }
}

/// Annualized mean daily return per symbol
#[derive(Debug, Clone, PartialEq)]
pub struct ExpectedReturns {
    pub symbols: Vec<String>,
    pub values: DVector<f64>,
}

impl ExpectedReturns {
    pub fn get(&self, symbol: &str) -> Option<f64> {
        self.symbols
            .iter()
            .position(|s| s == symbol)
            .map(|i| self.values[i])
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Annualized, ridge-regularized covariance of daily returns
#[derive(Debug, Clone, PartialEq)]
pub struct CovarianceMatrix {
    pub symbols: Vec<String>,
    pub values: DMatrix<f64>,
}

impl CovarianceMatrix {
    pub fn dim(&self) -> usize {
        self.values.nrows()
    }
}

/// Allocation per symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightVector {
    symbols: Vec<String>,
    values: Vec<f64>,
}

impl WeightVector {
    pub fn new(symbols: Vec<String>, values: Vec<f64>) -> Result<Self> {
        if symbols.len() != values.len() {
            return Err(PortfolioError::DimensionMismatch {
                expected: format!("{} weights", symbols.len()),
                actual: format!("{} weights", values.len()),
            });
        }
        Ok(Self { symbols, values })
    }

    /// Equal weight portfolio (1/N)
    pub fn equal(symbols: Vec<String>) -> Self {
        let n = symbols.len();
        let w = if n == 0 { 0.0 } else { 1.0 / n as f64 };
        Self {
            values: vec![w; n],
            symbols,
        }
    }

    /// Rescale so that the entries sum to exactly one
    pub fn normalized(self) -> Result<Self> {
        let sum = self.sum();
        if !sum.is_finite() || sum.abs() < f64::EPSILON {
            return Err(PortfolioError::InvalidInput(format!(
                "cannot normalize weights summing to {}",
                sum
            )));
        }
        Ok(Self {
            values: self.values.iter().map(|w| w / sum).collect(),
            symbols: self.symbols,
        })
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn get(&self, symbol: &str) -> Option<f64> {
        self.symbols
            .iter()
            .position(|s| s == symbol)
            .map(|i| self.values[i])
    }

    pub fn sum(&self) -> f64 {
        self.values.iter().sum()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_fully_invested(&self) -> bool {
        (self.sum() - 1.0).abs() < WEIGHT_SUM_TOLERANCE
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.symbols
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }
}

/// Realized portfolio performance over the analysis window, full precision
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Compounded return over the whole window
    pub cumulative_return: f64,
    /// Annualized portfolio volatility
    pub volatility: f64,
    pub sharpe_ratio: f64,
}

impl AnalysisResult {
    /// Rounded presentation view; never feed it back into calculations
    pub fn display(&self) -> DisplayMetrics {
        DisplayMetrics {
            cumulative_return_pct: round_to(self.cumulative_return * 100.0, 2),
            volatility_pct: round_to(self.volatility * 100.0, 2),
            sharpe_ratio: round_to(self.sharpe_ratio, 3),
        }
    }
}

/// Rounded metrics for presentation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayMetrics {
    pub cumulative_return_pct: f64,
    pub volatility_pct: f64,
    pub sharpe_ratio: f64,
}

/// One line of the allocation table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationRow {
    pub symbol: String,
    pub weight: f64,
    pub expected_return: f64,
    /// weight x expected return
    pub contribution: f64,
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
