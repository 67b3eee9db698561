//! Outer-join alignment of per-asset price series

use crate::error::{PortfolioError, Result};
use crate::types::{PriceMatrix, PriceSeries};
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};

/// Join series on the union of their dates, then forward-fill and back-fill.
///
/// Column order follows the order of `series`. Calendars that do not overlap
/// (crypto trades on weekends, equities do not) leave gaps that the fills
/// close; because every input series is non-empty no gap survives.
pub fn align_series(series: &[PriceSeries]) -> Result<PriceMatrix> {
    if series.is_empty() {
        return Err(PortfolioError::NoPriceData);
    }

    let dates: Vec<NaiveDate> = series
        .iter()
        .flat_map(|s| s.points().iter().map(|(d, _)| *d))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let index: HashMap<NaiveDate, usize> =
        dates.iter().enumerate().map(|(i, d)| (*d, i)).collect();

    let mut columns: Vec<Vec<Option<f64>>> = Vec::with_capacity(series.len());
    for s in series {
        let mut column = vec![None; dates.len()];
        for (date, price) in s.points() {
            column[index[date]] = Some(*price);
        }
        forward_fill(&mut column);
        backward_fill(&mut column);
        columns.push(column);
    }

    let mut rows = Vec::with_capacity(dates.len());
    for i in 0..dates.len() {
        let row = columns
            .iter()
            .zip(series)
            .map(|(column, s)| {
                column[i].ok_or_else(|| {
                    PortfolioError::Internal(format!("unfilled gap for {} at {}", s.symbol(), dates[i]))
                })
            })
            .collect::<Result<Vec<f64>>>()?;
        rows.push(row);
    }

    let symbols = series.iter().map(|s| s.symbol().to_string()).collect();
    PriceMatrix::from_rows(symbols, dates, &rows)
}

pub(crate) fn forward_fill(column: &mut [Option<f64>]) {
    let mut last = None;
    for value in column.iter_mut() {
        match value {
            Some(v) => last = Some(*v),
            None => *value = last,
        }
    }
}

pub(crate) fn backward_fill(column: &mut [Option<f64>]) {
    let mut next = None;
    for value in column.iter_mut().rev() {
        match value {
            Some(v) => next = Some(*v),
            None => *value = next,
        }
    }
}
