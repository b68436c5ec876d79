//! Portfolio valuation domain models.

use chrono::{DateTime, NaiveDate, Utc};
use kabufolio_market_data::Market;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::fx::{ExchangeRate, RateSource};

/// Value of one holding in the reporting currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingValuation {
    pub holding_id: String,
    pub symbol: String,
    pub name: String,
    pub market: Market,
    pub account: String,
    pub purchase_date: NaiveDate,
    pub quantity: Decimal,
    /// Per unit, market currency
    pub purchase_price: Decimal,
    /// Per unit, market currency
    pub current_price: Decimal,
    pub currency: String,
    /// 1 for domestic holdings, the exchange rate for foreign ones
    pub conversion_factor: Decimal,
    pub current_value: Decimal,
    pub cost_basis: Decimal,
    pub gain_loss: Decimal,
    pub gain_loss_pct: Decimal,
    /// A value left the `Decimal` range and was clamped
    #[serde(default)]
    pub saturated: bool,
}

/// Portfolio totals derived from holdings and an exchange rate.
///
/// Never stored and carries no timestamp: the same holdings and rate always
/// produce an equal summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub reporting_currency: String,
    pub total_value: Decimal,
    pub total_cost_basis: Decimal,
    pub total_gain_loss: Decimal,
    pub total_gain_loss_pct: Decimal,
    /// JPY per USD used for foreign holdings
    pub exchange_rate: Decimal,
    /// Some holding or total was clamped to the `Decimal` range
    #[serde(default)]
    pub saturated: bool,
    pub holdings: Vec<HoldingValuation>,
}

/// Outcome of the most recent refresh, kept beside the summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshStatus {
    /// A fetch failed or a value was served stale
    pub degraded: bool,
    /// Holdings priced at their last-known value because the fetch failed
    pub failed_symbols: Vec<String>,
    /// Holdings priced from a stale cache entry
    pub stale_symbols: Vec<String>,
    pub fx_source: RateSource,
    pub exchange_rate: ExchangeRate,
    /// Fetch and storage problems, in the order they happened
    pub warnings: Vec<String>,
    /// False when any refreshed price or the snapshot missed durable storage
    pub durable: bool,
    pub refreshed_at: Option<DateTime<Utc>>,
}

impl RefreshStatus {
    /// Status before the first refresh.
    pub fn initial(exchange_rate: ExchangeRate) -> Self {
        Self {
            degraded: false,
            failed_symbols: Vec::new(),
            stale_symbols: Vec::new(),
            fx_source: exchange_rate.source,
            exchange_rate,
            warnings: Vec::new(),
            durable: true,
            refreshed_at: None,
        }
    }
}

/// Result of a holding mutation: the changed value, the recomputed summary,
/// and a warning when the change did not reach durable storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationResult<T> {
    pub value: T,
    pub summary: PortfolioSummary,
    pub storage_warning: Option<String>,
}

impl<T> MutationResult<T> {
    pub fn is_durable(&self) -> bool {
        self.storage_warning.is_none()
    }
}
