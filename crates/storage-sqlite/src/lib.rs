//! SQLite storage implementation for Kabufolio.
//!
//! Implements the repository traits defined in `kabufolio-core` with Diesel:
//! - connection pooling and the single-writer actor
//! - embedded migrations
//! - holding and snapshot repositories with their row models
//!
//! This crate is the only place in the workspace where Diesel appears.
//!
//! ```text
//!     core (domain, traits)
//!              │
//!              ▼
//!   storage-sqlite (this crate)
//!              │
//!              ▼
//!          SQLite DB
//! ```

pub mod db;
pub mod errors;
pub mod schema;
pub mod utils;

pub mod holdings;
pub mod portfolio;

pub use db::{
    create_pool, get_connection, get_db_path, init, run_migrations, spawn_writer, DbConnection,
    DbPool, WriteHandle,
};
pub use errors::{IntoCore, StorageError};
pub use holdings::HoldingRepository;
pub use portfolio::snapshot::SnapshotRepository;

pub use kabufolio_core::errors::{DatabaseError, Error, Result};
