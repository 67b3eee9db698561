//! HTTP price sources
//!
//! - [`YahooClient`]: equities and funds (chart API, adjusted close)
//! - [`BinanceClient`]: crypto spot pairs (daily klines)
//! - [`FredClient`]: rates and macro series (graph CSV export)

mod binance;
mod fred;
#[cfg(test)]
mod tests;
mod yahoo;

pub use binance::{binance_symbol, BinanceClient};
pub use fred::FredClient;
pub use yahoo::YahooClient;

use crate::data::FetchError;
use reqwest::{Client, RequestBuilder, StatusCode};
use std::time::Duration;
use tracing::debug;

/// Transport timeout; the provider applies its own, usually shorter, budget
pub(crate) const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

pub(crate) fn http_client(user_agent: &str) -> reqwest::Result<Client> {
    Client::builder()
        .timeout(HTTP_TIMEOUT)
        .user_agent(user_agent)
        .build()
}

/// Send a request and return the body of a successful response.
///
/// Status codes are mapped onto [`FetchError`] so the caller can tell a
/// missing symbol from a flaky network.
pub(crate) async fn fetch_body(request: RequestBuilder, symbol: &str) -> Result<String, FetchError> {
    let response = request.send().await?;
    let status = response.status();
    debug!(url = %response.url(), status = status.as_u16(), "price request");

    if status == StatusCode::NOT_FOUND {
        return Err(FetchError::NotFound(symbol.to_string()));
    }

    if status == StatusCode::TOO_MANY_REQUESTS || status.as_u16() == 418 {
        let retry_after_secs = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        return Err(FetchError::RateLimited { retry_after_secs });
    }

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(FetchError::Http {
            status: status.as_u16(),
            message: body.chars().take(200).collect(),
        });
    }

    Ok(response.text().await?)
}
