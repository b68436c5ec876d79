use async_trait::async_trait;

use super::Holding;
use crate::errors::Result;

/// Durable storage for holdings.
#[async_trait]
pub trait HoldingRepositoryTrait: Send + Sync {
    /// All stored holdings, oldest first.
    fn list(&self) -> Result<Vec<Holding>>;

    async fn insert(&self, holding: Holding) -> Result<Holding>;

    /// Returns the number of rows removed (0 for an unknown id).
    async fn delete(&self, id: &str) -> Result<usize>;

    async fn delete_all(&self) -> Result<usize>;

    /// Overwrites the stock snapshot of each given holding, matched by id.
    async fn update_stocks(&self, holdings: &[Holding]) -> Result<usize>;
}
