//! Market data models
//!
//! - `market` - The two supported markets and their currency conventions
//! - `quote` - Price and exchange-rate values returned by providers
//! - `search` - Symbol search candidates

mod market;
mod quote;
mod search;

pub use market::Market;
pub use quote::{Price, Rate};
pub use search::StockCandidate;
