//! Yahoo Finance quote provider.
//!
//! Uses the public chart and search JSON endpoints; no API key required.
//! - Equities: `/v8/finance/chart/{symbol}` (`meta.regularMarketPrice`)
//! - USD/JPY: the chart of `USDJPY=X`
//! - Search: `/v1/finance/search`

mod models;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::Client;
use tracing::{debug, warn};
use urlencoding::encode;

use crate::errors::FetchError;
use crate::models::{Market, Price, Rate, StockCandidate};
use crate::provider::{http, price_from_f64, require_non_empty, QuoteProvider};
use crate::resolver::{classify_exchange, normalize_symbol};

use models::{YahooChartMeta, YahooChartResponse, YahooSearchResponse};

const BASE_URL: &str = "https://query1.finance.yahoo.com";
const PROVIDER_ID: &str = "YAHOO";
const USD_JPY_SYMBOL: &str = "USDJPY=X";
const SEARCH_LIMIT: &str = "10";

/// Yahoo Finance provider.
pub struct YahooChartProvider {
    client: Client,
    base_url: String,
}

impl Default for YahooChartProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl YahooChartProvider {
    pub fn new() -> Self {
        Self::with_timeout(http::DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            client: http::build_client(timeout),
            base_url: BASE_URL.to_string(),
        }
    }

    /// Points the provider at a different host (proxy, mirror).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn fetch_chart_meta(&self, symbol: &str) -> Result<YahooChartMeta, FetchError> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, encode(symbol));
        let params = [("interval", "1d"), ("range", "1d")];
        let body = http::get_text(&self.client, PROVIDER_ID, &url, &params).await?;
        parse_chart_meta(&body)
    }
}

#[async_trait]
impl QuoteProvider for YahooChartProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn get_price(&self, symbol: &str, market: Market) -> Result<Price, FetchError> {
        let symbol = normalize_symbol(require_non_empty(symbol, "symbol")?, market);
        let meta = self.fetch_chart_meta(&symbol).await?;
        price_from_meta(meta, &symbol, market)
    }

    async fn get_exchange_rate(&self) -> Result<Rate, FetchError> {
        let meta = self.fetch_chart_meta(USD_JPY_SYMBOL).await?;
        rate_from_meta(meta)
    }

    async fn search(
        &self,
        query: &str,
        market: Market,
    ) -> Result<Vec<StockCandidate>, FetchError> {
        let query = require_non_empty(query, "query")?;
        let url = format!("{}/v1/finance/search", self.base_url);
        let params = [
            ("q", query),
            ("quotesCount", SEARCH_LIMIT),
            ("newsCount", "0"),
        ];
        let body = http::get_text(&self.client, PROVIDER_ID, &url, &params).await?;
        let candidates = parse_search(&body, market)?;
        debug!(
            "Yahoo search '{}' on {} returned {} candidates",
            query,
            market,
            candidates.len()
        );
        Ok(candidates)
    }
}

/// Extracts the first chart result's metadata from a raw response body.
pub(crate) fn parse_chart_meta(body: &str) -> Result<YahooChartMeta, FetchError> {
    let response: YahooChartResponse = serde_json::from_str(body).map_err(|e| {
        FetchError::upstream(PROVIDER_ID, format!("Failed to parse chart response: {}", e))
    })?;

    if let Some(err) = response.chart.error {
        return Err(FetchError::upstream(
            PROVIDER_ID,
            format!(
                "{}: {}",
                err.code.unwrap_or_else(|| "Error".to_string()),
                err.description.unwrap_or_default()
            ),
        ));
    }

    response
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .map(|r| r.meta)
        .ok_or_else(|| FetchError::upstream(PROVIDER_ID, "Chart response has no result"))
}

fn price_from_meta(meta: YahooChartMeta, symbol: &str, market: Market) -> Result<Price, FetchError> {
    let raw = meta.regular_market_price.ok_or_else(|| {
        FetchError::upstream(PROVIDER_ID, format!("No market price for {}", symbol))
    })?;
    let value = price_from_f64(PROVIDER_ID, raw, "regularMarketPrice")?;

    let currency = match meta.currency {
        Some(c) if !c.is_empty() => c.to_ascii_uppercase(),
        _ => market.currency().to_string(),
    };
    if currency != market.currency() {
        warn!(
            "Yahoo reports {} for {} but {} trades in {}",
            currency,
            symbol,
            market,
            market.currency()
        );
    }

    Ok(Price {
        symbol: symbol.to_string(),
        market,
        value,
        currency,
        name: meta.short_name.or(meta.long_name),
        timestamp: timestamp_or_now(meta.regular_market_time),
        source: PROVIDER_ID.to_string(),
    })
}

fn rate_from_meta(meta: YahooChartMeta) -> Result<Rate, FetchError> {
    let raw = meta
        .regular_market_price
        .ok_or_else(|| FetchError::upstream(PROVIDER_ID, "No market price for USDJPY=X"))?;
    let value = price_from_f64(PROVIDER_ID, raw, "regularMarketPrice")?;
    if value.is_zero() {
        return Err(FetchError::upstream(PROVIDER_ID, "USD/JPY rate is zero"));
    }
    Ok(Rate::usd_jpy(
        value,
        timestamp_or_now(meta.regular_market_time),
        PROVIDER_ID,
    ))
}

/// Keeps equity and ETF hits that trade on `market`.
pub(crate) fn parse_search(body: &str, market: Market) -> Result<Vec<StockCandidate>, FetchError> {
    let response: YahooSearchResponse = serde_json::from_str(body).map_err(|e| {
        FetchError::upstream(PROVIDER_ID, format!("Failed to parse search response: {}", e))
    })?;

    Ok(response
        .quotes
        .into_iter()
        .filter(|q| {
            matches!(
                q.quote_type.as_deref(),
                Some("EQUITY") | Some("ETF") | None
            )
        })
        .filter_map(|q| {
            let exchange = q.exchange.unwrap_or_default();
            if classify_exchange(&exchange, &q.symbol) != Some(market) {
                return None;
            }
            let name = q
                .short_name
                .or(q.long_name)
                .unwrap_or_else(|| q.symbol.clone());
            Some(StockCandidate {
                symbol: q.symbol,
                name,
                market,
                exchange,
                currency: market.currency().to_string(),
            })
        })
        .collect())
}

fn timestamp_or_now(unix: Option<i64>) -> DateTime<Utc> {
    unix.and_then(|ts| Utc.timestamp_opt(ts, 0).single())
        .unwrap_or_else(Utc::now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const TOYOTA_CHART: &str = r#"{
        "chart": {
            "result": [{
                "meta": {
                    "currency": "JPY",
                    "symbol": "7203.T",
                    "regularMarketPrice": 2875.5,
                    "regularMarketTime": 1700000000,
                    "shortName": "TOYOTA MOTOR CORP"
                },
                "timestamp": [1700000000],
                "indicators": {"quote": [{}]}
            }],
            "error": null
        }
    }"#;

    #[test]
    fn test_parse_domestic_price() {
        let meta = parse_chart_meta(TOYOTA_CHART).unwrap();
        let price = price_from_meta(meta, "7203.T", Market::Domestic).unwrap();
        assert_eq!(price.value, dec!(2875.5));
        assert_eq!(price.currency, "JPY");
        assert_eq!(price.name.as_deref(), Some("TOYOTA MOTOR CORP"));
        assert_eq!(price.timestamp.timestamp(), 1_700_000_000);
        assert_eq!(price.source, "YAHOO");
    }

    #[test]
    fn test_chart_error_maps_to_upstream() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let err = parse_chart_meta(body).unwrap_err();
        assert!(matches!(err, FetchError::Upstream { .. }));
        assert!(err.to_string().contains("Not Found"));
    }

    #[test]
    fn test_malformed_body_maps_to_upstream() {
        let err = parse_chart_meta("<html>rate limited</html>").unwrap_err();
        assert!(matches!(err, FetchError::Upstream { .. }));
    }

    #[test]
    fn test_missing_price_maps_to_upstream() {
        let body = r#"{"chart":{"result":[{"meta":{"currency":"USD","symbol":"AAPL"}}],"error":null}}"#;
        let meta = parse_chart_meta(body).unwrap();
        let err = price_from_meta(meta, "AAPL", Market::Foreign).unwrap_err();
        assert!(matches!(err, FetchError::Upstream { .. }));
    }

    #[test]
    fn test_parse_usd_jpy_rate() {
        let body = r#"{"chart":{"result":[{"meta":{"currency":"JPY","symbol":"USDJPY=X","regularMarketPrice":151.25,"regularMarketTime":1700000000}}],"error":null}}"#;
        let rate = rate_from_meta(parse_chart_meta(body).unwrap()).unwrap();
        assert_eq!(rate.value, dec!(151.25));
        assert_eq!(rate.base, "USD");
        assert_eq!(rate.quote, "JPY");
    }

    #[test]
    fn test_zero_rate_is_rejected() {
        let body = r#"{"chart":{"result":[{"meta":{"regularMarketPrice":0.0}}],"error":null}}"#;
        assert!(rate_from_meta(parse_chart_meta(body).unwrap()).is_err());
    }

    #[test]
    fn test_search_filters_by_market() {
        let body = r#"{
            "quotes": [
                {"symbol": "7203.T", "shortname": "TOYOTA MOTOR CORP", "exchange": "JPX", "quoteType": "EQUITY"},
                {"symbol": "TM", "shortname": "Toyota Motor Corporation", "exchange": "NYQ", "quoteType": "EQUITY"},
                {"symbol": "TOYOF", "shortname": "Toyota OTC", "exchange": "PNK", "quoteType": "EQUITY"},
                {"symbol": "7203.T", "exchange": "JPX", "quoteType": "OPTION"}
            ]
        }"#;

        let domestic = parse_search(body, Market::Domestic).unwrap();
        assert_eq!(domestic.len(), 1);
        assert_eq!(domestic[0].symbol, "7203.T");
        assert_eq!(domestic[0].currency, "JPY");

        let foreign = parse_search(body, Market::Foreign).unwrap();
        assert_eq!(foreign.len(), 1);
        assert_eq!(foreign[0].symbol, "TM");
        assert_eq!(foreign[0].name, "Toyota Motor Corporation");
    }

    #[tokio::test]
    async fn test_empty_symbol_is_rejected_before_network() {
        let provider = YahooChartProvider::new().with_base_url("http://127.0.0.1:9");
        let err = provider.get_price("  ", Market::Foreign).await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidRequest(_)));
    }
}
