use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::{debug, warn};

use super::{Holding, HoldingRepositoryTrait, NewHolding};
use crate::errors::{Result, WriteOutcome};
use crate::utils::time_utils::Clock;

/// In-memory view of the user's holdings, written through to a repository.
///
/// Every write awaits the repository before returning. A failed repository
/// write is logged and reported in the [`WriteOutcome`], but the in-memory
/// state is updated regardless.
pub struct HoldingStore {
    repository: Arc<dyn HoldingRepositoryTrait>,
    clock: Arc<dyn Clock>,
    holdings: RwLock<Vec<Holding>>,
}

impl HoldingStore {
    /// Loads the stored holdings.
    pub fn load(repository: Arc<dyn HoldingRepositoryTrait>, clock: Arc<dyn Clock>) -> Result<Self> {
        let holdings = repository.list()?;
        debug!("Loaded {} holdings", holdings.len());
        Ok(Self {
            repository,
            clock,
            holdings: RwLock::new(holdings),
        })
    }

    /// Validates and stores a new holding.
    pub async fn create(&self, new_holding: NewHolding) -> Result<WriteOutcome<Holding>> {
        let now = self.clock.now();
        new_holding.validate(now.date_naive())?;
        let holding = new_holding.into_holding(now);

        let outcome = match self.repository.insert(holding.clone()).await {
            Ok(_) => WriteOutcome::durable(holding.clone()),
            Err(e) => {
                warn!("Holding {} kept in memory only: {}", holding.id, e);
                WriteOutcome::not_durable(holding.clone(), e)
            }
        };

        self.write_guard().push(holding);
        Ok(outcome)
    }

    /// Holdings in insertion order.
    pub fn list(&self) -> Vec<Holding> {
        self.read_guard().clone()
    }

    pub fn get(&self, id: &str) -> Option<Holding> {
        self.read_guard().iter().find(|h| h.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.read_guard().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_guard().is_empty()
    }

    /// Removes a holding. Unknown ids are a no-op and yield `false`.
    pub async fn delete(&self, id: &str) -> WriteOutcome<bool> {
        if self.get(id).is_none() {
            return WriteOutcome::durable(false);
        }

        let outcome = match self.repository.delete(id).await {
            Ok(_) => WriteOutcome::durable(true),
            Err(e) => {
                warn!("Holding {} removed from memory only: {}", id, e);
                WriteOutcome::not_durable(true, e)
            }
        };

        self.write_guard().retain(|h| h.id != id);
        outcome
    }

    /// Removes every holding and returns how many were held in memory.
    pub async fn clear(&self) -> WriteOutcome<usize> {
        let count = self.len();
        let outcome = match self.repository.delete_all().await {
            Ok(_) => WriteOutcome::durable(count),
            Err(e) => {
                warn!("Holdings cleared in memory only: {}", e);
                WriteOutcome::not_durable(count, e)
            }
        };

        self.write_guard().clear();
        outcome
    }

    /// Swaps in the stock snapshots of `updated`, matched by id.
    ///
    /// Holdings deleted in the meantime are skipped. Returns the number of
    /// holdings replaced in memory.
    pub async fn replace_stocks(&self, updated: Vec<Holding>) -> WriteOutcome<usize> {
        if updated.is_empty() {
            return WriteOutcome::durable(0);
        }

        let storage_error = self
            .repository
            .update_stocks(&updated)
            .await
            .err()
            .map(|e| {
                warn!("Refreshed prices kept in memory only: {}", e);
                e.to_string()
            });

        let by_id: HashMap<&str, &Holding> =
            updated.iter().map(|h| (h.id.as_str(), h)).collect();
        let mut replaced = 0;
        for holding in self.write_guard().iter_mut() {
            if let Some(fresh) = by_id.get(holding.id.as_str()) {
                *holding = holding.with_stock(fresh.stock.clone(), fresh.updated_at);
                replaced += 1;
            }
        }

        WriteOutcome {
            value: replaced,
            storage_error,
        }
    }

    fn read_guard(&self) -> RwLockReadGuard<'_, Vec<Holding>> {
        self.holdings.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_guard(&self) -> RwLockWriteGuard<'_, Vec<Holding>> {
        self.holdings
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
