use std::collections::VecDeque;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use log::{debug, warn};
use rust_decimal::Decimal;

use super::{PortfolioSnapshot, SnapshotRepositoryTrait, TimeRange};
use crate::errors::WriteOutcome;
use crate::utils::time_utils::Clock;

/// Append-only, capacity-bounded series of total portfolio value.
///
/// Holds at most `capacity` points in ascending time order and evicts the
/// oldest first. Storage is written through; when the repository fails the
/// series keeps working in memory.
pub struct SnapshotHistory {
    repository: Arc<dyn SnapshotRepositoryTrait>,
    clock: Arc<dyn Clock>,
    capacity: usize,
    entries: RwLock<VecDeque<PortfolioSnapshot>>,
}

impl SnapshotHistory {
    /// Loads the most recent `capacity` snapshots. A repository read failure
    /// starts an empty in-memory series.
    pub fn load(
        repository: Arc<dyn SnapshotRepositoryTrait>,
        capacity: usize,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let capacity = capacity.max(1);
        let mut stored = repository.list_since(None).unwrap_or_else(|e| {
            warn!("Could not load snapshot history, starting empty: {}", e);
            Vec::new()
        });
        stored.sort_by_key(|s| s.timestamp);
        let skip = stored.len().saturating_sub(capacity);
        let entries: VecDeque<PortfolioSnapshot> = stored.into_iter().skip(skip).collect();
        debug!("Loaded {} portfolio snapshots", entries.len());

        Self {
            repository,
            clock,
            capacity,
            entries: RwLock::new(entries),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.read_guard().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_guard().is_empty()
    }

    pub fn latest(&self) -> Option<PortfolioSnapshot> {
        self.read_guard().back().cloned()
    }

    /// Records `total_value` at the current time. Never fails; a storage
    /// error is carried in the outcome.
    pub async fn append(&self, total_value: Decimal) -> WriteOutcome<PortfolioSnapshot> {
        let now = self.clock.now();
        // Keep the series ordered even if the wall clock steps backwards.
        let timestamp = match self.latest() {
            Some(last) if last.timestamp > now => last.timestamp,
            _ => now,
        };
        let snapshot = PortfolioSnapshot::new(timestamp, total_value);

        let storage_error = match self.repository.append(&snapshot).await {
            Ok(()) => self.repository.prune_to(self.capacity).await.err(),
            Err(e) => Some(e),
        };

        {
            let mut entries = self.write_guard();
            entries.push_back(snapshot.clone());
            while entries.len() > self.capacity {
                entries.pop_front();
            }
        }

        match storage_error {
            None => WriteOutcome::durable(snapshot),
            Some(e) => {
                warn!("Snapshot {} kept in memory only: {}", snapshot.id, e);
                WriteOutcome::not_durable(snapshot, e)
            }
        }
    }

    /// Snapshots with `timestamp >= since`, oldest first.
    pub fn list(&self, since: Option<DateTime<Utc>>) -> Vec<PortfolioSnapshot> {
        self.read_guard()
            .iter()
            .filter(|s| since.map_or(true, |since| s.timestamp >= since))
            .cloned()
            .collect()
    }

    pub fn list_range(&self, range: TimeRange) -> Vec<PortfolioSnapshot> {
        self.list(Some(range.since(self.clock.now())))
    }

    fn read_guard(&self) -> RwLockReadGuard<'_, VecDeque<PortfolioSnapshot>> {
        self.entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_guard(&self) -> RwLockWriteGuard<'_, VecDeque<PortfolioSnapshot>> {
        self.entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
