//! Market suffix handling.
//!
//! Tokyo listings are addressed with a `.T` suffix by the quote providers
//! ("7203" -> "7203.T"). US listings carry no suffix.

use crate::models::Market;

/// US exchange codes as reported by Yahoo-style search endpoints.
const US_EXCHANGES: &[&str] = &[
    "NMS", "NGM", "NCM", "NAS", "NYQ", "NYS", "ASE", "PCX", "BTS", "NASDAQ", "NYSE", "AMEX",
    "ARCA", "BATS",
];

/// Tokyo exchange codes.
const JP_EXCHANGES: &[&str] = &["JPX", "TYO", "TSE"];

/// Normalizes a user-entered symbol for dispatch to a provider.
///
/// - Trims whitespace and uppercases.
/// - `Domestic`: appends `.T` unless the symbol already has an exchange suffix.
/// - `Foreign`: strips a stray `.T` suffix; other suffixes (e.g. `BRK.B`) are kept.
///
/// # Examples
///
/// ```
/// use kabufolio_market_data::{normalize_symbol, Market};
///
/// assert_eq!(normalize_symbol(" 7203 ", Market::Domestic), "7203.T");
/// assert_eq!(normalize_symbol("7203.T", Market::Domestic), "7203.T");
/// assert_eq!(normalize_symbol("aapl", Market::Foreign), "AAPL");
/// ```
pub fn normalize_symbol(symbol: &str, market: Market) -> String {
    let cleaned = symbol.trim().to_ascii_uppercase();
    if cleaned.is_empty() {
        return cleaned;
    }

    match market.provider_suffix() {
        Some(suffix) => {
            if has_exchange_suffix(&cleaned) {
                cleaned
            } else {
                format!("{}{}", cleaned, suffix)
            }
        }
        None => match cleaned.strip_suffix(".T") {
            Some(base) if !base.is_empty() => base.to_string(),
            _ => cleaned,
        },
    }
}

/// Removes the provider suffix of `market` for display.
pub fn strip_market_suffix(symbol: &str, market: Market) -> &str {
    match market.provider_suffix() {
        Some(suffix) => symbol.strip_suffix(suffix).unwrap_or(symbol),
        None => symbol,
    }
}

/// Infers the market of a search hit from its exchange code and symbol.
///
/// Returns `None` for listings outside the two supported markets.
pub fn classify_exchange(exchange: &str, symbol: &str) -> Option<Market> {
    let exchange = exchange.trim().to_ascii_uppercase();
    if symbol.ends_with(".T") || JP_EXCHANGES.contains(&exchange.as_str()) {
        return Some(Market::Domestic);
    }
    if US_EXCHANGES.contains(&exchange.as_str()) && !has_exchange_suffix(symbol) {
        return Some(Market::Foreign);
    }
    None
}

/// Exchange suffixes are short alphabetic tails after the last dot
/// ("7203.T", "SHOP.TO"). Share-class dots ("BRK.B") look the same, so this
/// only matters for domestic symbols, which are numeric codes.
fn has_exchange_suffix(symbol: &str) -> bool {
    match symbol.rsplit_once('.') {
        Some((base, tail)) => {
            !base.is_empty()
                && !tail.is_empty()
                && tail.len() <= 2
                && tail.chars().all(|c| c.is_ascii_alphabetic())
        }
        None => false,
    }
}
