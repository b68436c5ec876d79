//! SQLite storage for the portfolio value history.

mod model;
mod repository;

pub use model::PortfolioSnapshotDB;
pub use repository::SnapshotRepository;

pub use kabufolio_core::portfolio::snapshot::SnapshotRepositoryTrait;
