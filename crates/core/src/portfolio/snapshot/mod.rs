//! Portfolio snapshot module - bounded history of total portfolio value.

mod snapshot_model;
mod snapshot_service;
mod snapshot_traits;

pub use snapshot_model::*;
pub use snapshot_service::SnapshotHistory;
pub use snapshot_traits::*;
