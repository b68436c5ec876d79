//! Quote provider abstractions and implementations.
//!
//! This module contains:
//! - The `QuoteProvider` trait that all providers implement
//! - A shared HTTP helper that maps transport and status failures to `FetchError`
//! - Concrete providers: Yahoo Finance chart API and a generic REST backend
//!
//! Providers hold no cache and no state beyond their HTTP client; freshness
//! and fallback are handled by the caller.

mod http;
mod traits;

pub mod backend;
pub mod yahoo;

pub use http::DEFAULT_TIMEOUT;
pub use traits::QuoteProvider;

use crate::errors::FetchError;

/// Rejects empty symbols / queries before they reach the network.
pub(crate) fn require_non_empty<'a>(value: &'a str, what: &str) -> Result<&'a str, FetchError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(FetchError::InvalidRequest(format!("{} must not be empty", what)));
    }
    Ok(trimmed)
}

/// Converts a provider float to `Decimal`, rejecting NaN, infinities and
/// negative prices as a malformed body.
pub(crate) fn price_from_f64(
    provider: &str,
    value: f64,
    field: &str,
) -> Result<rust_decimal::Decimal, FetchError> {
    use num_traits::FromPrimitive;

    if !value.is_finite() || value < 0.0 {
        return Err(FetchError::upstream(
            provider,
            format!("Invalid {} in response: {}", field, value),
        ));
    }
    rust_decimal::Decimal::from_f64(value).ok_or_else(|| {
        FetchError::upstream(provider, format!("Invalid {} in response: {}", field, value))
    })
}
