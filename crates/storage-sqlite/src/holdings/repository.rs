use async_trait::async_trait;
use diesel::dsl::sql;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::sql_types::BigInt;
use diesel::SqliteConnection;
use log::warn;
use std::sync::Arc;

use kabufolio_core::holdings::{Holding, HoldingRepositoryTrait};
use kabufolio_core::Result;

use super::model::HoldingDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::holdings;
use crate::utils::format_timestamp;

pub struct HoldingRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl HoldingRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        HoldingRepository { pool, writer }
    }

    fn list_impl(&self) -> Result<Vec<Holding>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = holdings::table
            .order((holdings::created_at.asc(), sql::<BigInt>("rowid").asc()))
            .select(HoldingDB::as_select())
            .load::<HoldingDB>(&mut conn)
            .map_err(StorageError::from)?;

        Ok(rows
            .into_iter()
            .filter_map(|row| match Holding::try_from(row) {
                Ok(holding) => Some(holding),
                Err(e) => {
                    warn!("Skipping unreadable holding row: {}", e);
                    None
                }
            })
            .collect())
    }
}

#[async_trait]
impl HoldingRepositoryTrait for HoldingRepository {
    fn list(&self) -> Result<Vec<Holding>> {
        self.list_impl()
    }

    async fn insert(&self, holding: Holding) -> Result<Holding> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Holding> {
                diesel::insert_into(holdings::table)
                    .values(HoldingDB::from(&holding))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(holding)
            })
            .await
    }

    async fn delete(&self, id: &str) -> Result<usize> {
        let id = id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                Ok(diesel::delete(holdings::table.find(id))
                    .execute(conn)
                    .map_err(StorageError::from)?)
            })
            .await
    }

    async fn delete_all(&self) -> Result<usize> {
        self.writer
            .exec(|conn: &mut SqliteConnection| -> Result<usize> {
                Ok(diesel::delete(holdings::table)
                    .execute(conn)
                    .map_err(StorageError::from)?)
            })
            .await
    }

    async fn update_stocks(&self, updated: &[Holding]) -> Result<usize> {
        if updated.is_empty() {
            return Ok(0);
        }
        let updated = updated.to_vec();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let mut affected_rows = 0;
                for holding in &updated {
                    affected_rows += diesel::update(holdings::table.find(&holding.id))
                        .set((
                            holdings::symbol.eq(&holding.stock.symbol),
                            holdings::name.eq(&holding.stock.name),
                            holdings::market.eq(holding.stock.market.as_str()),
                            holdings::price.eq(holding.stock.price.to_string()),
                            holdings::currency.eq(&holding.stock.currency),
                            holdings::updated_at.eq(format_timestamp(&holding.updated_at)),
                        ))
                        .execute(conn)
                        .map_err(StorageError::from)?;
                }
                Ok(affected_rows)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, run_migrations, spawn_writer};
    use chrono::{NaiveDate, TimeZone, Utc};
    use kabufolio_core::holdings::Stock;
    use kabufolio_market_data::Market;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    async fn create_test_repository() -> (HoldingRepository, tempfile::TempDir) {
        let temp_dir = tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test.db");

        let pool = create_pool(&db_path.to_string_lossy()).expect("Failed to create pool");
        run_migrations(&pool).expect("Failed to run migrations");
        let writer = spawn_writer((*pool).clone());

        (HoldingRepository::new(pool, writer), temp_dir)
    }

    fn holding(id: &str, symbol: &str, market: Market) -> Holding {
        let created = Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap();
        Holding {
            id: id.to_string(),
            stock: Stock::new(symbol, "Test", market, dec!(100.25)),
            quantity: dec!(10),
            purchase_price: dec!(95.5),
            purchase_date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            account: "NISA".to_string(),
            created_at: created,
            updated_at: created,
        }
    }

    #[tokio::test]
    async fn test_insert_round_trips_every_field() {
        let (repo, _dir) = create_test_repository().await;
        let original = holding("h-1", "7203", Market::Domestic);

        repo.insert(original.clone()).await.unwrap();
        let loaded = repo.list().unwrap();

        assert_eq!(loaded, vec![original]);
        assert_eq!(loaded[0].stock.symbol, "7203.T");
    }

    #[tokio::test]
    async fn test_list_keeps_insertion_order_for_equal_timestamps() {
        let (repo, _dir) = create_test_repository().await;
        for id in ["c", "a", "b"] {
            repo.insert(holding(id, "AAPL", Market::Foreign)).await.unwrap();
        }

        let ids: Vec<String> = repo.list().unwrap().into_iter().map(|h| h.id).collect();

        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[tokio::test]
    async fn test_duplicate_id_is_unique_violation() {
        let (repo, _dir) = create_test_repository().await;
        repo.insert(holding("h-1", "AAPL", Market::Foreign)).await.unwrap();

        let err = repo
            .insert(holding("h-1", "MSFT", Market::Foreign))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            kabufolio_core::Error::Database(kabufolio_core::errors::DatabaseError::UniqueViolation(_))
        ));
        assert_eq!(repo.list().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_and_delete_all() {
        let (repo, _dir) = create_test_repository().await;
        repo.insert(holding("h-1", "AAPL", Market::Foreign)).await.unwrap();
        repo.insert(holding("h-2", "7203", Market::Domestic)).await.unwrap();
        repo.insert(holding("h-3", "6758", Market::Domestic)).await.unwrap();

        assert_eq!(repo.delete("missing").await.unwrap(), 0);
        assert_eq!(repo.delete("h-1").await.unwrap(), 1);
        assert_eq!(repo.delete_all().await.unwrap(), 2);
        assert!(repo.list().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_stocks_only_touches_stock_columns() {
        let (repo, _dir) = create_test_repository().await;
        let original = holding("h-1", "AAPL", Market::Foreign);
        repo.insert(original.clone()).await.unwrap();

        let later = original.updated_at + chrono::Duration::minutes(10);
        let refreshed = original.with_stock(original.stock.with_price(dec!(121)), later);
        let affected = repo.update_stocks(&[refreshed.clone()]).await.unwrap();
        let loaded = repo.list().unwrap().remove(0);

        assert_eq!(affected, 1);
        assert_eq!(loaded.stock.price, dec!(121));
        assert_eq!(loaded.updated_at, later);
        assert_eq!(loaded.quantity, original.quantity);
        assert_eq!(loaded.purchase_price, original.purchase_price);
        assert_eq!(loaded.created_at, original.created_at);
        assert_eq!(repo.update_stocks(&[]).await.unwrap(), 0);
    }
}
