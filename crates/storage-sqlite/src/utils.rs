//! Column codecs and batching helpers shared by the repositories.
//!
//! Decimals and timestamps are stored as TEXT. Timestamps use a fixed-width
//! UTC RFC 3339 form so that string order matches time order.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use log::error;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Maximum number of parameters for SQLite IN (...) queries.
///
/// SQLite's default SQLITE_MAX_VARIABLE_NUMBER is 999; 500 leaves room for
/// the other parameters of a statement.
pub const SQLITE_MAX_PARAMS_CHUNK: usize = 500;

/// Splits `items` into slices of at most [`SQLITE_MAX_PARAMS_CHUNK`].
pub fn chunk_for_sqlite<T>(items: &[T]) -> impl Iterator<Item = &[T]> {
    items.chunks(SQLITE_MAX_PARAMS_CHUNK)
}

pub fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(column: &str, raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|e| {
            error!("Failed to parse DB {} '{}': {}", column, raw, e);
            DateTime::<Utc>::UNIX_EPOCH
        })
}

pub fn format_date(value: &NaiveDate) -> String {
    value.format("%Y-%m-%d").to_string()
}

pub fn parse_date(column: &str, raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap_or_else(|e| {
        error!("Failed to parse DB {} '{}': {}", column, raw, e);
        NaiveDate::default()
    })
}

pub fn parse_decimal(column: &str, raw: &str) -> Decimal {
    Decimal::from_str(raw).unwrap_or_else(|e| {
        error!("Failed to parse DB {} '{}': {}", column, raw, e);
        Decimal::ZERO
    })
}
