//! Kabufolio Market Data Crate
//!
//! Provider-agnostic access to equity prices, the USD/JPY exchange rate and
//! symbol search for the two supported markets (Tokyo and US).
//!
//! # Architecture
//!
//! ```text
//! +------------------+     +------------------+
//! |   Core (cache)   | --> |  QuoteProvider   |  (uniform async trait)
//! +------------------+     +------------------+
//!                                  |
//!                 +----------------+----------------+
//!                 v                                 v
//!        +------------------+             +------------------+
//!        |  Yahoo (chart)   |             |  REST backend    |
//!        +------------------+             +------------------+
//! ```
//!
//! Providers never cache and never persist. Every failure is reported as a
//! [`FetchError`]: `Upstream` for bad statuses or bodies, `Unreachable` for
//! timeouts and connection failures.

pub mod errors;
pub mod models;
pub mod provider;
pub mod resolver;

pub use errors::FetchError;
pub use models::{Market, Price, Rate, StockCandidate};
pub use provider::backend::BackendQuoteProvider;
pub use provider::yahoo::YahooChartProvider;
pub use provider::{QuoteProvider, DEFAULT_TIMEOUT};
pub use resolver::{classify_exchange, normalize_symbol, strip_market_suffix};
