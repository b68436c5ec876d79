//! Generic REST JSON backend provider.
//!
//! Talks to a self-hosted quote backend that fronts the real data vendors:
//! - `GET {base}/api/quote?symbol=&market=` -> `{ "symbol", "name", "price", "currency" }`
//! - `GET {base}/api/exchange-rate` -> `{ "rate", "timestamp"? }`
//! - `GET {base}/api/search?q=&market=` -> `[{ "symbol", "name", "exchange", "currency" }]`

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::errors::FetchError;
use crate::models::{Market, Price, Rate, StockCandidate};
use crate::provider::{http, price_from_f64, require_non_empty, QuoteProvider};
use crate::resolver::normalize_symbol;

const PROVIDER_ID: &str = "BACKEND";

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    symbol: Option<String>,
    name: Option<String>,
    price: Option<f64>,
    currency: Option<String>,
    /// Unix seconds
    timestamp: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RateResponse {
    rate: Option<f64>,
    timestamp: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    symbol: String,
    name: Option<String>,
    exchange: Option<String>,
    currency: Option<String>,
}

/// Provider backed by a custom quote API.
pub struct BackendQuoteProvider {
    client: Client,
    base_url: String,
}

impl BackendQuoteProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, http::DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: http::build_client(timeout),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl QuoteProvider for BackendQuoteProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn get_price(&self, symbol: &str, market: Market) -> Result<Price, FetchError> {
        let symbol = normalize_symbol(require_non_empty(symbol, "symbol")?, market);
        let params = [("symbol", symbol.as_str()), ("market", market.as_str())];
        let body = http::get_text(&self.client, PROVIDER_ID, &self.url("/api/quote"), &params)
            .await?;
        parse_quote(&body, &symbol, market)
    }

    async fn get_exchange_rate(&self) -> Result<Rate, FetchError> {
        let body =
            http::get_text(&self.client, PROVIDER_ID, &self.url("/api/exchange-rate"), &[])
                .await?;
        parse_rate(&body)
    }

    async fn search(
        &self,
        query: &str,
        market: Market,
    ) -> Result<Vec<StockCandidate>, FetchError> {
        let query = require_non_empty(query, "query")?;
        let params = [("q", query), ("market", market.as_str())];
        let body = http::get_text(&self.client, PROVIDER_ID, &self.url("/api/search"), &params)
            .await?;
        parse_search(&body, market)
    }
}

fn parse_quote(body: &str, symbol: &str, market: Market) -> Result<Price, FetchError> {
    let response: QuoteResponse = serde_json::from_str(body).map_err(|e| {
        FetchError::upstream(PROVIDER_ID, format!("Failed to parse quote response: {}", e))
    })?;

    let raw = response
        .price
        .ok_or_else(|| FetchError::upstream(PROVIDER_ID, format!("No price for {}", symbol)))?;
    let value = price_from_f64(PROVIDER_ID, raw, "price")?;

    Ok(Price {
        symbol: response.symbol.unwrap_or_else(|| symbol.to_string()),
        market,
        value,
        currency: response
            .currency
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| market.currency().to_string()),
        name: response.name,
        timestamp: timestamp_or_now(response.timestamp),
        source: PROVIDER_ID.to_string(),
    })
}

fn parse_rate(body: &str) -> Result<Rate, FetchError> {
    let response: RateResponse = serde_json::from_str(body).map_err(|e| {
        FetchError::upstream(PROVIDER_ID, format!("Failed to parse rate response: {}", e))
    })?;
    let raw = response
        .rate
        .ok_or_else(|| FetchError::upstream(PROVIDER_ID, "Rate response has no rate"))?;
    let value = price_from_f64(PROVIDER_ID, raw, "rate")?;
    if value.is_zero() {
        return Err(FetchError::upstream(PROVIDER_ID, "USD/JPY rate is zero"));
    }
    Ok(Rate::usd_jpy(
        value,
        timestamp_or_now(response.timestamp),
        PROVIDER_ID,
    ))
}

fn parse_search(body: &str, market: Market) -> Result<Vec<StockCandidate>, FetchError> {
    let items: Vec<SearchItem> = serde_json::from_str(body).map_err(|e| {
        FetchError::upstream(PROVIDER_ID, format!("Failed to parse search response: {}", e))
    })?;
    Ok(items
        .into_iter()
        .map(|item| StockCandidate {
            name: item.name.unwrap_or_else(|| item.symbol.clone()),
            symbol: item.symbol,
            market,
            exchange: item.exchange.unwrap_or_default(),
            currency: item
                .currency
                .unwrap_or_else(|| market.currency().to_string()),
        })
        .collect())
}

fn timestamp_or_now(unix: Option<i64>) -> DateTime<Utc> {
    unix.and_then(|ts| Utc.timestamp_opt(ts, 0).single())
        .unwrap_or_else(Utc::now)
}
