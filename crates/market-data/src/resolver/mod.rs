//! Symbol resolution.
//!
//! Maps user-entered tickers to the provider-facing form for each market.
//! Everything in here is pure and independent of any provider.

mod market_suffix;

pub use market_suffix::{classify_exchange, normalize_symbol, strip_market_suffix};
