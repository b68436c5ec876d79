//! Repository traits for portfolio snapshots.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::PortfolioSnapshot;
use crate::errors::Result;

/// Repository trait for the bounded snapshot series.
#[async_trait]
pub trait SnapshotRepositoryTrait: Send + Sync {
    /// Snapshots with `timestamp >= since`, oldest first. `None` returns all.
    fn list_since(&self, since: Option<DateTime<Utc>>) -> Result<Vec<PortfolioSnapshot>>;

    async fn append(&self, snapshot: &PortfolioSnapshot) -> Result<()>;

    /// Deletes the oldest snapshots until at most `keep` remain. Returns the
    /// number deleted.
    async fn prune_to(&self, keep: usize) -> Result<usize>;
}
