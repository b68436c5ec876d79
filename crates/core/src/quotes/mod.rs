//! Quotes module - TTL-bounded cache in front of the quote provider.
//!
//! The cache is the only component that talks to a [`QuoteProvider`]. Every
//! provider call is bounded by the configured fetch timeout, fresh entries
//! short-circuit the network, and a failed fetch falls back to the last
//! cached value (marked [`Freshness::Stale`]) when one exists.
//!
//! [`QuoteProvider`]: kabufolio_market_data::QuoteProvider

mod cache_model;
mod price_cache;

pub use cache_model::*;
pub use price_cache::PriceCache;
