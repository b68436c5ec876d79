use chrono::{DateTime, Utc};
use kabufolio_market_data::{Market, Rate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Where the exchange rate in use came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RateSource {
    /// Fetched from the provider during this refresh
    Live,
    /// Served from the cache (fresh, or stale after a failed fetch)
    Cached,
    /// Configured default; no rate has ever been fetched
    Fallback,
}

/// Reporting-currency units per one foreign-currency unit (JPY per USD).
///
/// Replaced as a whole on refresh, never partially updated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRate {
    pub rate: Decimal,
    pub timestamp: DateTime<Utc>,
    pub source: RateSource,
}

impl ExchangeRate {
    pub fn new(rate: Decimal, timestamp: DateTime<Utc>, source: RateSource) -> Self {
        Self {
            rate,
            timestamp,
            source,
        }
    }

    /// The documented default used before the first successful fetch.
    pub fn fallback(rate: Decimal, timestamp: DateTime<Utc>) -> Self {
        Self::new(rate, timestamp, RateSource::Fallback)
    }

    pub fn from_provider(rate: &Rate, source: RateSource) -> Self {
        Self::new(rate.value, rate.timestamp, source)
    }

    /// Same rate value, relabelled (e.g. a live rate later served from cache).
    pub fn with_source(&self, source: RateSource) -> Self {
        Self {
            source,
            ..self.clone()
        }
    }

    /// Multiplier that converts an amount in `market`'s currency into the
    /// reporting currency. Domestic amounts are already in JPY.
    pub fn conversion_factor(&self, market: Market) -> Decimal {
        match market {
            Market::Domestic => Decimal::ONE,
            Market::Foreign => self.rate,
        }
    }

    /// Converts `amount`, clamping at the `Decimal` range.
    pub fn to_reporting(&self, amount: Decimal, market: Market) -> Decimal {
        amount.saturating_mul(self.conversion_factor(market))
    }
}
