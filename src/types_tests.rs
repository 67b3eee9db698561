//! Tests for core types

#[cfg(test)]
mod tests {
    use super::super::types::*;
    use crate::error::PortfolioError;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    #[test]
    fn test_date_range_is_half_open() {
        let range = DateRange::parse("2024-05-01", "2024-05-10").unwrap();
        assert!(range.contains(day(1)));
        assert!(range.contains(day(9)));
        assert!(!range.contains(day(10)));
    }

    #[test]
    fn test_date_range_rejects_inverted() {
        assert!(matches!(
            DateRange::parse("2024-05-10", "2024-05-10"),
            Err(PortfolioError::InvalidDateRange { .. })
        ));
        assert!(matches!(
            DateRange::parse("2024-13-01", "2024-05-10"),
            Err(PortfolioError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_date_range_deserialize_validates() {
        let range: DateRange =
            serde_json::from_str(r#"{"start":"2024-05-01","end":"2024-05-10"}"#).unwrap();
        assert_eq!(range, DateRange::parse("2024-05-01", "2024-05-10").unwrap());

        let inverted: Result<DateRange, _> =
            serde_json::from_str(r#"{"start":"2024-05-10","end":"2024-05-01"}"#);
        let err = inverted.unwrap_err();
        assert!(err.to_string().contains("must be before end"), "{}", err);
    }

    #[test]
    fn test_series_sorts_filters_and_dedupes() {
        let series = PriceSeries::from_observations(
            "X",
            vec![
                (day(3), 30.0),
                (day(1), 10.0),
                (day(2), f64::NAN),
                (day(3), 31.0),
                (day(4), 0.0),
            ],
        )
        .unwrap();

        assert_eq!(series.points(), &[(day(1), 10.0), (day(3), 31.0)]);
        assert_eq!(series.first_date(), Some(day(1)));
        assert_eq!(series.last_date(), Some(day(3)));
    }

    #[test]
    fn test_series_without_usable_prices() {
        assert!(PriceSeries::from_observations("X", vec![(day(1), -1.0)]).is_none());
    }

    #[test]
    fn test_price_matrix_validation() {
        let symbols = vec!["A".to_string(), "B".to_string()];

        let ok = PriceMatrix::from_rows(symbols.clone(), vec![day(1), day(2)], &[vec![1.0, 2.0], vec![1.5, 2.5]]);
        assert_eq!(ok.unwrap().column("B"), Some(vec![2.0, 2.5]));

        let ragged = PriceMatrix::from_rows(symbols.clone(), vec![day(1)], &[vec![1.0]]);
        assert!(matches!(ragged, Err(PortfolioError::DimensionMismatch { .. })));

        let unordered = PriceMatrix::from_rows(symbols.clone(), vec![day(2), day(1)], &[vec![1.0, 2.0], vec![1.0, 2.0]]);
        assert!(matches!(unordered, Err(PortfolioError::InvalidInput(_))));

        let gap = PriceMatrix::from_rows(symbols, vec![day(1)], &[vec![1.0, f64::NAN]]);
        assert!(matches!(gap, Err(PortfolioError::InvalidInput(_))));
    }

    #[test]
    fn test_equal_weights() {
        let w = WeightVector::equal(vec!["A".into(), "B".into(), "C".into(), "D".into()]);
        assert_eq!(w.values(), &[0.25, 0.25, 0.25, 0.25]);
        assert!(w.is_fully_invested());
    }

    #[test]
    fn test_normalize_weights() {
        let w = WeightVector::new(vec!["A".into(), "B".into()], vec![2.0, 6.0])
            .unwrap()
            .normalized()
            .unwrap();
        assert_eq!(w.get("A"), Some(0.25));
        assert_eq!(w.get("B"), Some(0.75));

        let zero = WeightVector::new(vec!["A".into(), "B".into()], vec![1.0, -1.0]).unwrap();
        assert!(zero.normalized().is_err());
    }

    #[test]
    fn test_weight_vector_length_mismatch() {
        assert!(matches!(
            WeightVector::new(vec!["A".into()], vec![0.5, 0.5]),
            Err(PortfolioError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_display_metrics_rounding() {
        let result = AnalysisResult {
            cumulative_return: 0.123456,
            volatility: 0.0987654,
            sharpe_ratio: 1.23456,
        };
        let display = result.display();

        assert_eq!(display.cumulative_return_pct, 12.35);
        assert_eq!(display.volatility_pct, 9.88);
        assert_eq!(display.sharpe_ratio, 1.235);
        // full precision is untouched
        assert_eq!(result.cumulative_return, 0.123456);
    }

    #[test]
    fn test_weight_vector_serialization() {
        let w = WeightVector::new(vec!["SPY".into()], vec![1.0]).unwrap();
        let json = serde_json::to_string(&w).unwrap();
        assert_eq!(json, r#"{"symbols":["SPY"],"values":[1.0]}"#);
    }
}
