//! FRED graph CSV client for rate and macro series

use super::{fetch_body, http_client};
use crate::data::{FetchError, PriceSource};
use crate::error::Result;
use crate::types::{DateRange, PriceSeries};
use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use reqwest::Client;

/// FRED marks missing observations with a lone dot
const MISSING: &str = ".";

/// Series observations from `/graph/fredgraph.csv` (no API key required)
#[derive(Clone)]
pub struct FredClient {
    http: Client,
    base_url: String,
}

impl FredClient {
    pub fn new(base_url: &str, user_agent: &str) -> Result<Self> {
        Ok(Self {
            http: http_client(user_agent)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl PriceSource for FredClient {
    fn name(&self) -> &'static str {
        "fred"
    }

    async fn fetch(&self, symbol: &str, range: &DateRange) -> std::result::Result<PriceSeries, FetchError> {
        // coed is inclusive, our range is not
        let last = range
            .end()
            .checked_sub_days(Days::new(1))
            .unwrap_or_else(|| range.start());
        let url = format!("{}/graph/fredgraph.csv", self.base_url);
        let request = self.http.get(&url).query(&[
            ("id", symbol.to_string()),
            ("cosd", range.start().format("%Y-%m-%d").to_string()),
            ("coed", last.format("%Y-%m-%d").to_string()),
        ]);

        let body = fetch_body(request, symbol).await?;
        parse_csv(symbol, &body, range)
    }
}

/// Parse `DATE,VALUE` rows, skipping missing markers
pub(crate) fn parse_csv(
    symbol: &str,
    body: &str,
    range: &DateRange,
) -> std::result::Result<PriceSeries, FetchError> {
    let mut lines = body.lines().map(str::trim).filter(|l| !l.is_empty());

    let header = lines
        .next()
        .ok_or_else(|| FetchError::Malformed("empty CSV body".into()))?;
    let first_column = header.split(',').next().unwrap_or_default().to_lowercase();
    if header.split(',').count() < 2 || !(first_column == "date" || first_column == "observation_date") {
        return Err(FetchError::Malformed(format!(
            "unexpected CSV header '{}'",
            header.chars().take(60).collect::<String>()
        )));
    }

    let mut observations = Vec::new();
    for line in lines {
        let mut fields = line.split(',');
        let (date, value) = match (fields.next(), fields.next()) {
            (Some(d), Some(v)) => (d.trim(), v.trim()),
            _ => return Err(FetchError::Malformed(format!("bad CSV row '{}'", line))),
        };

        if value == MISSING || value.is_empty() {
            continue;
        }
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|e| FetchError::Malformed(format!("bad date '{}': {}", date, e)))?;
        let value: f64 = value
            .parse()
            .map_err(|_| FetchError::Malformed(format!("bad value '{}'", value)))?;

        if range.contains(date) {
            observations.push((date, value));
        }
    }

    PriceSeries::from_observations(symbol, observations).ok_or(FetchError::Empty)
}
