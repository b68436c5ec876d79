//! Holdings module - user positions and their write-through store.

mod holdings_model;
mod holdings_service;
mod holdings_traits;

pub use holdings_model::*;
pub use holdings_service::HoldingStore;
pub use holdings_traits::HoldingRepositoryTrait;
