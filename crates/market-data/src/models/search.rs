//! Search result models for symbol lookup.

use serde::{Deserialize, Serialize};

use super::market::Market;

/// Stock returned by a provider symbol search.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockCandidate {
    /// Provider symbol (e.g. "7203.T", "AAPL")
    pub symbol: String,

    /// Display name (e.g. "TOYOTA MOTOR CORP")
    pub name: String,

    pub market: Market,

    /// Exchange code as reported by the provider (e.g. "JPX", "NMS")
    pub exchange: String,

    pub currency: String,
}
