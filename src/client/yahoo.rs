//! Yahoo Finance chart API client for equities and funds

use super::{fetch_body, http_client};
use crate::data::{FetchError, PriceSource};
use crate::error::Result;
use crate::types::{DateRange, PriceSeries};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime};
use reqwest::Client;
use serde::Deserialize;

const SECONDS_PER_DAY: i64 = 86_400;

/// Daily bars from `/v8/finance/chart/{symbol}`
#[derive(Clone)]
pub struct YahooClient {
    http: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: Option<ChartMeta>,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

/// Exchange offset from UTC in seconds, applied to bar timestamps
#[derive(Debug, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
    #[serde(default)]
    adjclose: Vec<AdjClose>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct AdjClose {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

impl YahooClient {
    pub fn new(base_url: &str, user_agent: &str) -> Result<Self> {
        Ok(Self {
            http: http_client(user_agent)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl PriceSource for YahooClient {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    async fn fetch(&self, symbol: &str, range: &DateRange) -> std::result::Result<PriceSeries, FetchError> {
        // bars are stamped at the local open, up to a day away from UTC midnight
        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);
        let request = self.http.get(&url).query(&[
            ("period1", (unix_seconds(range.start()) - SECONDS_PER_DAY).to_string()),
            ("period2", (unix_seconds(range.end()) + SECONDS_PER_DAY).to_string()),
            ("interval", "1d".to_string()),
            ("events", "history".to_string()),
        ]);

        let body = fetch_body(request, symbol).await?;
        parse_chart(symbol, &body, range)
    }
}

fn unix_seconds(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp()
}

/// Reduce a chart response to one close column, adjusted close when present
pub(crate) fn parse_chart(
    symbol: &str,
    body: &str,
    range: &DateRange,
) -> std::result::Result<PriceSeries, FetchError> {
    let envelope: ChartEnvelope =
        serde_json::from_str(body).map_err(|e| FetchError::Malformed(e.to_string()))?;

    if let Some(err) = envelope.chart.error {
        let detail = err.description.unwrap_or_default();
        return Err(if err.code.eq_ignore_ascii_case("Not Found") {
            FetchError::NotFound(format!("{} ({})", symbol, detail))
        } else {
            FetchError::Malformed(format!("{}: {}", err.code, detail))
        });
    }

    let result = envelope
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or(FetchError::Empty)?;

    let gmtoffset = result.meta.as_ref().map_or(0, |m| m.gmtoffset);

    let adjusted = result
        .indicators
        .adjclose
        .into_iter()
        .next()
        .map(|a| a.adjclose)
        .filter(|v| v.len() == result.timestamp.len() && v.iter().any(Option::is_some));
    let closes = match adjusted {
        Some(values) => values,
        None => result
            .indicators
            .quote
            .into_iter()
            .next()
            .map(|q| q.close)
            .ok_or_else(|| FetchError::Malformed("no close column".into()))?,
    };

    if closes.len() != result.timestamp.len() {
        return Err(FetchError::Malformed(format!(
            "{} timestamps but {} closes",
            result.timestamp.len(),
            closes.len()
        )));
    }

    let observations = result
        .timestamp
        .iter()
        .zip(closes)
        .filter_map(|(ts, close)| {
            let date = DateTime::from_timestamp(ts + gmtoffset, 0)?.date_naive();
            Some((date, close?))
        })
        .filter(|(date, _)| range.contains(*date));

    PriceSeries::from_observations(symbol, observations).ok_or(FetchError::Empty)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range() -> DateRange {
        DateRange::parse("2024-01-01", "2024-02-01").unwrap()
    }

    // 2024-01-02, 2024-01-03, 2024-01-04 at 14:30 UTC
    const TS: &str = "[1704205800, 1704292200, 1704378600]";

    #[test]
    fn test_prefers_adjusted_close() {
        let body = format!(
            r#"{{"chart":{{"result":[{{"timestamp":{},"indicators":{{
                "quote":[{{"close":[190.0, 185.0, 182.0]}}],
                "adjclose":[{{"adjclose":[189.5, 184.6, 181.7]}}]}}}}],"error":null}}}}"#,
            TS
        );
        let series = parse_chart("AAPL", &body, &range()).unwrap();

        assert_eq!(series.symbol(), "AAPL");
        assert_eq!(series.len(), 3);
        assert_eq!(series.points()[0].1, 189.5);
        assert_eq!(
            series.first_date(),
            Some(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap())
        );
    }

    #[test]
    fn test_falls_back_to_close_and_drops_nulls() {
        let body = format!(
            r#"{{"chart":{{"result":[{{"timestamp":{},"indicators":{{
                "quote":[{{"close":[100.0, null, 102.0]}}]}}}}],"error":null}}}}"#,
            TS
        );
        let series = parse_chart("SPY", &body, &range()).unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series.points()[1].1, 102.0);
    }

    #[test]
    fn test_not_found_error() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let err = parse_chart("NOPE", body, &range()).unwrap_err();
        assert!(matches!(err, FetchError::NotFound(_)));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_malformed_body() {
        let err = parse_chart("AAPL", "<html>oops</html>", &range()).unwrap_err();
        assert!(matches!(err, FetchError::Malformed(_)));
    }

    #[test]
    fn test_dates_follow_exchange_offset() {
        // ASX opens at 10:00 AEDT, 23:00Z on the previous UTC day
        let body = r#"{"chart":{"result":[{"meta":{"gmtoffset":39600},
            "timestamp":[1704150000, 1704236400],
            "indicators":{"quote":[{"close":[46.5, 46.9]}]}}],"error":null}}"#;
        let range = DateRange::parse("2024-01-02", "2024-01-10").unwrap();
        let series = parse_chart("BHP.AX", body, &range).unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series.first_date(), Some(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()));
        assert_eq!(series.last_date(), Some(NaiveDate::from_ymd_opt(2024, 1, 3).unwrap()));
    }

    #[test]
    fn test_negative_offset_keeps_session_date() {
        // New York close stamped 21:00Z is still the same local day
        let body = r#"{"chart":{"result":[{"meta":{"gmtoffset":-18000},
            "timestamp":[1704229200],
            "indicators":{"quote":[{"close":[190.0]}]}}],"error":null}}"#;
        let series = parse_chart("AAPL", body, &range()).unwrap();
        assert_eq!(series.first_date(), Some(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()));
    }

    #[test]
    fn test_out_of_range_only_is_empty() {
        let body = r#"{"chart":{"result":[{"timestamp":[1714521600],"indicators":{"quote":[{"close":[10.0]}]}}],"error":null}}"#;
        let err = parse_chart("AAPL", body, &range()).unwrap_err();
        assert_eq!(err, FetchError::Empty);
    }
}
