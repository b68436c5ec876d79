//! Kabufolio Core - Domain entities, services, and traits.
//!
//! This crate contains the portfolio valuation engine: the price cache in
//! front of the quote provider, the holding store, the snapshot history and
//! the engine that ties them together. It is database-agnostic and defines
//! repository traits that are implemented by the `storage-sqlite` crate.

pub mod constants;
pub mod errors;
pub mod events;
pub mod fx;
pub mod holdings;
pub mod portfolio;
pub mod quotes;
pub mod settings;
pub mod utils;

#[cfg(test)]
mod test_support;

// Re-export common types from the holdings and portfolio modules
pub use holdings::*;
pub use portfolio::*;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
