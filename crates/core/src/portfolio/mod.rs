//! Portfolio module - valuation and snapshot history.

pub mod snapshot;
pub mod valuation;

pub use snapshot::{PortfolioSnapshot, SnapshotHistory, SnapshotRepositoryTrait, TimeRange};
pub use valuation::{
    HoldingValuation, MutationResult, PortfolioSummary, RefreshStatus, ValuationEngine,
};
