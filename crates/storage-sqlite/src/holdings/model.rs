//! Database model for holdings.

use diesel::prelude::*;
use kabufolio_core::holdings::{Holding, Stock};
use kabufolio_market_data::Market;
use std::str::FromStr;

use crate::errors::StorageError;
use crate::utils::{format_date, format_timestamp, parse_date, parse_decimal, parse_timestamp};

/// One row per holding; the owned stock snapshot is flattened into it.
#[derive(Queryable, Identifiable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::holdings)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct HoldingDB {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub market: String,
    pub price: String,
    pub currency: String,
    pub quantity: String,
    pub purchase_price: String,
    pub purchase_date: String,
    pub account: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Holding> for HoldingDB {
    fn from(domain: &Holding) -> Self {
        Self {
            id: domain.id.clone(),
            symbol: domain.stock.symbol.clone(),
            name: domain.stock.name.clone(),
            market: domain.stock.market.as_str().to_string(),
            price: domain.stock.price.to_string(),
            currency: domain.stock.currency.clone(),
            quantity: domain.quantity.to_string(),
            purchase_price: domain.purchase_price.to_string(),
            purchase_date: format_date(&domain.purchase_date),
            account: domain.account.clone(),
            created_at: format_timestamp(&domain.created_at),
            updated_at: format_timestamp(&domain.updated_at),
        }
    }
}

impl TryFrom<HoldingDB> for Holding {
    type Error = StorageError;

    /// Numeric and date columns fall back to defaults when unreadable; an
    /// unknown market rejects the row.
    fn try_from(db: HoldingDB) -> Result<Self, Self::Error> {
        let market = Market::from_str(&db.market)
            .map_err(|e| StorageError::CorruptRow(format!("holding {}: {}", db.id, e)))?;

        Ok(Self {
            stock: Stock {
                symbol: db.symbol,
                name: db.name,
                market,
                price: parse_decimal("price", &db.price),
                currency: db.currency,
            },
            quantity: parse_decimal("quantity", &db.quantity),
            purchase_price: parse_decimal("purchase_price", &db.purchase_price),
            purchase_date: parse_date("purchase_date", &db.purchase_date),
            account: db.account,
            created_at: parse_timestamp("created_at", &db.created_at),
            updated_at: parse_timestamp("updated_at", &db.updated_at),
            id: db.id,
        })
    }
}
