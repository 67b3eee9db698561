//! Request-level tests for the HTTP price sources against a local mock server

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::data::{FetchError, PriceSource};
    use crate::types::DateRange;
    use chrono::{Days, NaiveDate};
    use serde_json::{json, Value};
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const AGENT: &str = "portfolio-optimizer-tests";
    const DAY_MS: i64 = 86_400_000;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn millis(day: NaiveDate) -> i64 {
        day.and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp_millis()
    }

    fn kline(open_ms: i64, close: f64) -> Value {
        json!([
            open_ms,
            "1.0",
            "1.0",
            "1.0",
            close.to_string(),
            "10.0",
            open_ms + DAY_MS - 1,
            "0",
            0,
            "0",
            "0",
            "0"
        ])
    }

    fn klines(first_open_ms: i64, count: usize) -> Value {
        Value::Array(
            (0..count)
                .map(|i| kline(first_open_ms + i as i64 * DAY_MS, 100.0 + i as f64))
                .collect(),
        )
    }

    // ==================== Binance ====================

    #[tokio::test]
    async fn test_binance_paginates_until_short_page() {
        let server = MockServer::start().await;
        let range = DateRange::parse("2020-01-01", "2023-01-01").unwrap();
        let start_ms = millis(range.start());
        let second_start_ms = start_ms + 999 * DAY_MS + 1;

        Mock::given(method("GET"))
            .and(path("/api/v3/klines"))
            .and(query_param("symbol", "BTCUSDT"))
            .and(query_param("limit", "1000"))
            .and(query_param("startTime", start_ms.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(klines(start_ms, 1000)))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v3/klines"))
            .and(query_param("startTime", second_start_ms.to_string()))
            .and(query_param("endTime", (millis(range.end()) - 1).to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(klines(start_ms + 1000 * DAY_MS, 96)))
            .expect(1)
            .mount(&server)
            .await;

        let client = BinanceClient::new(&server.uri(), AGENT).unwrap();
        let series = client.fetch("BTC-USD", &range).await.unwrap();

        assert_eq!(series.symbol(), "BTC-USD");
        assert_eq!(series.len(), 1096);
        assert_eq!(series.first_date(), Some(date(2020, 1, 1)));
        assert_eq!(series.last_date(), Some(date(2022, 12, 31)));
        assert_eq!(series.points()[1000].1, 100.0);
    }

    #[tokio::test]
    async fn test_binance_single_short_page() {
        let server = MockServer::start().await;
        let range = DateRange::parse("2024-01-01", "2024-01-04").unwrap();

        Mock::given(method("GET"))
            .and(path("/api/v3/klines"))
            .respond_with(ResponseTemplate::new(200).set_body_json(klines(millis(range.start()), 3)))
            .expect(1)
            .mount(&server)
            .await;

        let client = BinanceClient::new(&server.uri(), AGENT).unwrap();
        let series = client.fetch("eth/usd", &range).await.unwrap();
        assert_eq!(series.len(), 3);
    }

    #[tokio::test]
    async fn test_binance_invalid_symbol_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/klines"))
            .respond_with(
                ResponseTemplate::new(400).set_body_string(r#"{"code":-1121,"msg":"Invalid symbol."}"#),
            )
            .mount(&server)
            .await;

        let client = BinanceClient::new(&server.uri(), AGENT).unwrap();
        let range = DateRange::parse("2024-01-01", "2024-02-01").unwrap();
        let err = client.fetch("NOPE-USD", &range).await.unwrap_err();

        assert_eq!(err, FetchError::NotFound("NOPEUSDT".into()));
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_binance_other_bad_request_stays_http() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/klines"))
            .respond_with(
                ResponseTemplate::new(400).set_body_string(r#"{"code":-1100,"msg":"Illegal characters."}"#),
            )
            .mount(&server)
            .await;

        let client = BinanceClient::new(&server.uri(), AGENT).unwrap();
        let range = DateRange::parse("2024-01-01", "2024-02-01").unwrap();
        let err = client.fetch("BTC-USD", &range).await.unwrap_err();

        assert!(matches!(err, FetchError::Http { status: 400, .. }));
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_binance_teapot_is_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(418))
            .mount(&server)
            .await;

        let client = BinanceClient::new(&server.uri(), AGENT).unwrap();
        let range = DateRange::parse("2024-01-01", "2024-02-01").unwrap();
        let err = client.fetch("BTC-USD", &range).await.unwrap_err();

        assert_eq!(err, FetchError::RateLimited { retry_after_secs: None });
        assert!(err.is_transient());
    }

    // ==================== Yahoo ====================

    #[tokio::test]
    async fn test_yahoo_fetch_uses_exchange_dates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v8/finance/chart/BHP.AX"))
            .and(query_param("interval", "1d"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "chart": {
                    "result": [{
                        "meta": {"gmtoffset": 39600},
                        "timestamp": [1704150000, 1704236400],
                        "indicators": {"quote": [{"close": [46.5, 46.9]}]}
                    }],
                    "error": null
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = YahooClient::new(&server.uri(), AGENT).unwrap();
        let range = DateRange::parse("2024-01-02", "2024-01-10").unwrap();
        let series = client.fetch("BHP.AX", &range).await.unwrap();

        assert_eq!(series.first_date(), Some(date(2024, 1, 2)));
        assert_eq!(series.len(), 2);
    }

    #[tokio::test]
    async fn test_yahoo_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string(
                r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found"}}}"#,
            ))
            .mount(&server)
            .await;

        let client = YahooClient::new(&server.uri(), AGENT).unwrap();
        let range = DateRange::parse("2024-01-01", "2024-02-01").unwrap();
        let err = client.fetch("ZZZZ", &range).await.unwrap_err();

        assert_eq!(err, FetchError::NotFound("ZZZZ".into()));
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_yahoo_rate_limit_reads_retry_after() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "7"))
            .mount(&server)
            .await;

        let client = YahooClient::new(&server.uri(), AGENT).unwrap();
        let range = DateRange::parse("2024-01-01", "2024-02-01").unwrap();
        let err = client.fetch("AAPL", &range).await.unwrap_err();

        assert_eq!(err, FetchError::RateLimited { retry_after_secs: Some(7) });
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_yahoo_server_error_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
            .mount(&server)
            .await;

        let client = YahooClient::new(&server.uri(), AGENT).unwrap();
        let range = DateRange::parse("2024-01-01", "2024-02-01").unwrap();
        let err = client.fetch("AAPL", &range).await.unwrap_err();

        assert_eq!(
            err,
            FetchError::Http {
                status: 503,
                message: "upstream unavailable".into()
            }
        );
        assert!(err.is_transient());
    }

    // ==================== FRED ====================

    #[tokio::test]
    async fn test_fred_requests_inclusive_end() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/graph/fredgraph.csv"))
            .and(query_param("id", "DGS10"))
            .and(query_param("cosd", "2024-01-01"))
            .and(query_param("coed", "2024-01-05"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("observation_date,DGS10\n2024-01-01,.\n2024-01-02,3.95\n2024-01-03,3.91\n"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = FredClient::new(&server.uri(), AGENT).unwrap();
        let range = DateRange::parse("2024-01-01", "2024-01-06").unwrap();
        let series = client.fetch("DGS10", &range).await.unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series.first_date(), Some(date(2024, 1, 2)));
    }

    #[tokio::test]
    async fn test_fred_server_error_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = FredClient::new(&server.uri(), AGENT).unwrap();
        let range = DateRange::parse("2024-01-01", "2024-01-06").unwrap();
        let err = client.fetch("DGS10", &range).await.unwrap_err();

        assert!(matches!(err, FetchError::Http { status: 500, .. }));
        assert!(err.is_transient());
    }

    // ==================== Transport ====================

    #[tokio::test]
    async fn test_transport_timeout_maps_to_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(50))
            .build()
            .unwrap();
        let err = fetch_body(http.get(server.uri()), "AAPL").await.unwrap_err();

        assert_eq!(err, FetchError::Timeout(HTTP_TIMEOUT.as_millis() as u64));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_range_end_is_exclusive_for_klines() {
        let server = MockServer::start().await;
        let range = DateRange::parse("2024-01-01", "2024-01-03").unwrap();
        let start_ms = millis(range.start());

        // a source that ignores endTime still cannot leak the end date
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(klines(start_ms, 3)))
            .mount(&server)
            .await;

        let client = BinanceClient::new(&server.uri(), AGENT).unwrap();
        let series = client.fetch("BTC-USD", &range).await.unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series.last_date(), range.end().checked_sub_days(Days::new(1)));
    }
}
