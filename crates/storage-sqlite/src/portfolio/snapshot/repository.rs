use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;
use log::debug;
use std::sync::Arc;

use kabufolio_core::portfolio::snapshot::{PortfolioSnapshot, SnapshotRepositoryTrait};
use kabufolio_core::Result;

use super::model::PortfolioSnapshotDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::portfolio_snapshots;
use crate::utils::{chunk_for_sqlite, format_timestamp};

pub struct SnapshotRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl SnapshotRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl SnapshotRepositoryTrait for SnapshotRepository {
    fn list_since(&self, since: Option<DateTime<Utc>>) -> Result<Vec<PortfolioSnapshot>> {
        let mut conn = get_connection(&self.pool)?;
        let mut query = portfolio_snapshots::table
            .select(PortfolioSnapshotDB::as_select())
            .order(portfolio_snapshots::timestamp.asc())
            .into_boxed();
        if let Some(since) = since {
            query = query.filter(portfolio_snapshots::timestamp.ge(format_timestamp(&since)));
        }

        let rows = query
            .load::<PortfolioSnapshotDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(PortfolioSnapshot::from).collect())
    }

    async fn append(&self, snapshot: &PortfolioSnapshot) -> Result<()> {
        let row = PortfolioSnapshotDB::from(snapshot);
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                diesel::insert_into(portfolio_snapshots::table)
                    .values(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    async fn prune_to(&self, keep: usize) -> Result<usize> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let total: i64 = portfolio_snapshots::table
                    .count()
                    .get_result(conn)
                    .map_err(StorageError::from)?;
                let excess = usize::try_from(total).unwrap_or(0).saturating_sub(keep);
                if excess == 0 {
                    return Ok(0);
                }

                let oldest: Vec<String> = portfolio_snapshots::table
                    .select(portfolio_snapshots::id)
                    .order(portfolio_snapshots::timestamp.asc())
                    .limit(excess as i64)
                    .load(conn)
                    .map_err(StorageError::from)?;

                let mut deleted = 0;
                for chunk in chunk_for_sqlite(&oldest) {
                    deleted += diesel::delete(
                        portfolio_snapshots::table.filter(portfolio_snapshots::id.eq_any(chunk)),
                    )
                    .execute(conn)
                    .map_err(StorageError::from)?;
                }
                debug!("Pruned {} portfolio snapshots beyond {}", deleted, keep);
                Ok(deleted)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, run_migrations, spawn_writer};
    use chrono::{Duration, TimeZone};
    use rust_decimal::Decimal;
    use tempfile::tempdir;

    async fn create_test_repository() -> (SnapshotRepository, tempfile::TempDir) {
        let temp_dir = tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test.db");

        let pool = create_pool(&db_path.to_string_lossy()).expect("Failed to create pool");
        run_migrations(&pool).expect("Failed to run migrations");
        let writer = spawn_writer((*pool).clone());

        (SnapshotRepository::new(pool, writer), temp_dir)
    }

    fn snapshot_at(minutes: i64, value: i64) -> PortfolioSnapshot {
        let base = Utc.with_ymd_and_hms(2024, 6, 3, 0, 0, 0).unwrap();
        PortfolioSnapshot::new(base + Duration::minutes(minutes), Decimal::from(value))
    }

    #[tokio::test]
    async fn test_append_and_list_oldest_first() {
        let (repo, _dir) = create_test_repository().await;
        repo.append(&snapshot_at(10, 200)).await.unwrap();
        repo.append(&snapshot_at(0, 100)).await.unwrap();

        let all = repo.list_since(None).unwrap();

        assert_eq!(all.len(), 2);
        assert_eq!(all[0].total_value, Decimal::from(100));
        assert_eq!(all[1].total_value, Decimal::from(200));
    }

    #[tokio::test]
    async fn test_list_since_is_inclusive() {
        let (repo, _dir) = create_test_repository().await;
        for i in 0..5 {
            repo.append(&snapshot_at(i * 60, i)).await.unwrap();
        }
        let cutoff = snapshot_at(120, 0).timestamp;

        let recent = repo.list_since(Some(cutoff)).unwrap();

        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].timestamp, cutoff);
    }

    #[tokio::test]
    async fn test_prune_to_removes_oldest() {
        let (repo, _dir) = create_test_repository().await;
        for i in 0..7 {
            repo.append(&snapshot_at(i, i)).await.unwrap();
        }

        let deleted = repo.prune_to(4).await.unwrap();
        let remaining = repo.list_since(None).unwrap();

        assert_eq!(deleted, 3);
        let values: Vec<Decimal> = remaining.iter().map(|s| s.total_value).collect();
        assert_eq!(values, (3..7).map(Decimal::from).collect::<Vec<_>>());
        assert_eq!(repo.prune_to(4).await.unwrap(), 0);
    }
}
