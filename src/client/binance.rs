//! Binance spot klines client for crypto pairs

use super::{fetch_body, http_client};
use crate::data::{FetchError, PriceSource};
use crate::error::Result;
use crate::types::{DateRange, PriceSeries};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime};
use reqwest::Client;
use serde_json::Value;

/// Maximum klines per request allowed by the API
const PAGE_LIMIT: usize = 1000;

/// Binance error code for an unknown trading pair
const INVALID_SYMBOL_CODE: &str = "-1121";

/// Daily close prices from `/api/v3/klines`
#[derive(Clone)]
pub struct BinanceClient {
    http: Client,
    base_url: String,
}

impl BinanceClient {
    pub fn new(base_url: &str, user_agent: &str) -> Result<Self> {
        Ok(Self {
            http: http_client(user_agent)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn fetch_page(
        &self,
        pair: &str,
        start_ms: i64,
        end_ms: i64,
    ) -> std::result::Result<Vec<(i64, f64)>, FetchError> {
        let url = format!("{}/api/v3/klines", self.base_url);
        let request = self.http.get(&url).query(&[
            ("symbol", pair.to_string()),
            ("interval", "1d".to_string()),
            ("startTime", start_ms.to_string()),
            ("endTime", end_ms.to_string()),
            ("limit", PAGE_LIMIT.to_string()),
        ]);

        let body = fetch_body(request, pair).await.map_err(|e| match e {
            FetchError::Http { status: 400, message } if message.contains(INVALID_SYMBOL_CODE) => {
                FetchError::NotFound(pair.to_string())
            }
            other => other,
        })?;
        parse_klines(&body)
    }
}

#[async_trait]
impl PriceSource for BinanceClient {
    fn name(&self) -> &'static str {
        "binance"
    }

    async fn fetch(&self, symbol: &str, range: &DateRange) -> std::result::Result<PriceSeries, FetchError> {
        let pair = binance_symbol(symbol);
        let end_ms = unix_millis(range.end()) - 1;
        let mut start_ms = unix_millis(range.start());
        let mut klines = Vec::new();

        loop {
            let page = self.fetch_page(&pair, start_ms, end_ms).await?;
            let full = page.len() >= PAGE_LIMIT;
            let last_open = page.last().map(|(t, _)| *t);
            klines.extend(page);

            match last_open {
                Some(t) if full && t + 1 <= end_ms => start_ms = t + 1,
                _ => break,
            }
        }

        let observations = klines.into_iter().filter_map(|(open_ms, close)| {
            let date = DateTime::from_timestamp_millis(open_ms)?.date_naive();
            range.contains(date).then_some((date, close))
        });

        PriceSeries::from_observations(symbol, observations).ok_or(FetchError::Empty)
    }
}

fn unix_millis(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp_millis()
}

/// Map user-facing tickers onto Binance pair names.
///
/// `BTC-USD` and `btc/usd` become `BTCUSDT`; pairs already in exchange
/// form (`ETHBTC`) are only upper-cased.
pub fn binance_symbol(symbol: &str) -> String {
    let upper = symbol.trim().to_uppercase();
    match upper.split_once(['-', '/', '_']) {
        Some((base, "USD")) => format!("{}USDT", base),
        Some((base, quote)) => format!("{}{}", base, quote),
        None => upper,
    }
}

/// Extract `(open_time_ms, close)` from the kline array-of-arrays payload
pub(crate) fn parse_klines(body: &str) -> std::result::Result<Vec<(i64, f64)>, FetchError> {
    let rows: Vec<Vec<Value>> =
        serde_json::from_str(body).map_err(|e| FetchError::Malformed(e.to_string()))?;

    rows.iter()
        .map(|row| {
            let open_ms = row
                .first()
                .and_then(Value::as_i64)
                .ok_or_else(|| FetchError::Malformed("kline without open time".into()))?;
            let close = row
                .get(4)
                .and_then(|v| match v {
                    Value::String(s) => s.parse::<f64>().ok(),
                    other => other.as_f64(),
                })
                .ok_or_else(|| FetchError::Malformed("kline without close price".into()))?;
            Ok((open_ms, close))
        })
        .collect()
}
