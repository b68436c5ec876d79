//! Holding and stock domain models.

use chrono::{DateTime, NaiveDate, Utc};
use kabufolio_market_data::{normalize_symbol, Market};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::MAX_HOLDING_AMOUNT;
use crate::errors::ValidationError;

/// Snapshot of a listed stock as owned by a holding.
///
/// Immutable: a price refresh builds a new `Stock` with [`Stock::with_price`]
/// and the holding swaps it in whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stock {
    /// Market-qualified symbol ("7203.T", "AAPL")
    pub symbol: String,
    pub name: String,
    pub market: Market,
    /// Last-known price in the market's currency
    pub price: Decimal,
    #[serde(default)]
    pub currency: String,
}

impl Stock {
    /// Builds a stock with a normalized symbol and the market's currency.
    pub fn new(symbol: &str, name: impl Into<String>, market: Market, price: Decimal) -> Self {
        Self {
            symbol: normalize_symbol(symbol, market),
            name: name.into(),
            market,
            price,
            currency: market.currency().to_string(),
        }
    }

    pub fn with_price(&self, price: Decimal) -> Self {
        Self {
            price,
            ..self.clone()
        }
    }

    /// Fills in the normalized symbol, a missing name and a missing currency.
    fn normalized(self) -> Self {
        let symbol = normalize_symbol(&self.symbol, self.market);
        let name = match self.name.trim() {
            "" => symbol.clone(),
            trimmed => trimmed.to_string(),
        };
        let currency = match self.currency.trim() {
            "" => self.market.currency().to_string(),
            code => code.to_ascii_uppercase(),
        };
        Self {
            symbol,
            name,
            currency,
            ..self
        }
    }
}

/// A position entered by the user.
///
/// Quantity and purchase price are fixed at creation; only the owned
/// [`Stock`] snapshot is ever replaced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub id: String,
    pub stock: Stock,
    pub quantity: Decimal,
    pub purchase_price: Decimal,
    pub purchase_date: NaiveDate,
    pub account: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Holding {
    pub fn market(&self) -> Market {
        self.stock.market
    }

    pub fn symbol(&self) -> &str {
        &self.stock.symbol
    }

    /// Returns a copy owning `stock`; every other field is kept.
    pub fn with_stock(&self, stock: Stock, updated_at: DateTime<Utc>) -> Self {
        Self {
            stock,
            updated_at,
            ..self.clone()
        }
    }
}

/// Input model for creating a new holding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewHolding {
    pub stock: Stock,
    pub quantity: Decimal,
    pub purchase_price: Decimal,
    pub purchase_date: NaiveDate,
    #[serde(default)]
    pub account: String,
}

impl NewHolding {
    /// Validates the input against `today` (purchase dates may not be in the
    /// future).
    pub fn validate(&self, today: NaiveDate) -> Result<(), ValidationError> {
        if self.stock.symbol.trim().is_empty() {
            return Err(ValidationError::MissingField("symbol".to_string()));
        }
        if self.quantity <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveQuantity(self.quantity));
        }
        if self.purchase_price <= Decimal::ZERO {
            return Err(ValidationError::NonPositivePurchasePrice(
                self.purchase_price,
            ));
        }
        if self.stock.price < Decimal::ZERO {
            return Err(ValidationError::InvalidInput(format!(
                "Stock price cannot be negative, got {}",
                self.stock.price
            )));
        }
        for (field, amount) in [
            ("quantity", self.quantity),
            ("purchasePrice", self.purchase_price),
            ("price", self.stock.price),
        ] {
            if amount > MAX_HOLDING_AMOUNT {
                return Err(ValidationError::InvalidInput(format!(
                    "{} exceeds {}, got {}",
                    field, MAX_HOLDING_AMOUNT, amount
                )));
            }
        }
        if self.purchase_date > today {
            return Err(ValidationError::InvalidInput(format!(
                "Purchase date {} is in the future",
                self.purchase_date
            )));
        }
        Ok(())
    }

    /// Assigns an id and timestamps. Call [`validate`](Self::validate) first.
    pub fn into_holding(self, now: DateTime<Utc>) -> Holding {
        Holding {
            id: Uuid::new_v4().to_string(),
            stock: self.stock.normalized(),
            quantity: self.quantity,
            purchase_price: self.purchase_price,
            purchase_date: self.purchase_date,
            account: self.account.trim().to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}
