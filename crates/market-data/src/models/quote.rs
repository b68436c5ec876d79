use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::market::Market;

/// Latest price for a single symbol.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Price {
    /// Symbol as sent to the provider (already normalized)
    pub symbol: String,

    pub market: Market,

    /// Last traded / regular market price
    pub value: Decimal,

    /// Quote currency reported by the provider
    pub currency: String,

    /// Display name, when the provider returns one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    pub timestamp: DateTime<Utc>,

    /// Provider id (YAHOO, BACKEND, ...)
    pub source: String,
}

/// USD/JPY exchange rate.
///
/// `value` is the number of `quote` units for one `base` unit, i.e. JPY per
/// one USD.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rate {
    pub base: String,
    pub quote: String,
    pub value: Decimal,
    pub timestamp: DateTime<Utc>,
    pub source: String,
}

impl Rate {
    pub fn usd_jpy(value: Decimal, timestamp: DateTime<Utc>, source: impl Into<String>) -> Self {
        Self {
            base: "USD".to_string(),
            quote: "JPY".to_string(),
            value,
            timestamp,
            source: source.into(),
        }
    }
}
