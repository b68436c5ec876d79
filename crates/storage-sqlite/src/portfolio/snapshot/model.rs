use diesel::prelude::*;
use kabufolio_core::portfolio::snapshot::PortfolioSnapshot;

use crate::utils::{format_timestamp, parse_decimal, parse_timestamp};

#[derive(Queryable, Identifiable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::portfolio_snapshots)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PortfolioSnapshotDB {
    pub id: String,
    pub timestamp: String,
    pub total_value: String,
}

impl From<&PortfolioSnapshot> for PortfolioSnapshotDB {
    fn from(domain: &PortfolioSnapshot) -> Self {
        Self {
            id: domain.id.clone(),
            timestamp: format_timestamp(&domain.timestamp),
            total_value: domain.total_value.to_string(),
        }
    }
}

impl From<PortfolioSnapshotDB> for PortfolioSnapshot {
    fn from(db: PortfolioSnapshotDB) -> Self {
        Self {
            timestamp: parse_timestamp("timestamp", &db.timestamp),
            total_value: parse_decimal("total_value", &db.total_value),
            id: db.id,
        }
    }
}
