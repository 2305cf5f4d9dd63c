//! SQLite storage implementation for Nestegg.
//!
//! This crate provides all database-related functionality using Diesel ORM with SQLite.
//! It implements the repository traits defined in `nestegg-core` and contains:
//! - Database connection pooling and management
//! - Diesel migrations
//! - Repository implementations for positions, profiles, snapshots and valuation refreshes
//! - Database-specific model types (with Diesel derives)
//!
//! # Architecture
//!
//! This crate is the only place in the application where Diesel dependencies exist.
//! Every write goes through the single writer actor, one immediate transaction per job.
//!
//! ```text
//!   core (domain)        worker (app)
//!         │                   │
//!         └─────────┬─────────┘
//!                   │
//!                   ▼
//!         storage-sqlite (this crate)
//!                   │
//!                   ▼
//!               SQLite DB
//! ```

pub mod db;
pub mod errors;
pub mod schema;
pub mod utils;

// Repository implementations
pub mod positions;
pub mod profiles;
pub mod snapshots;
pub mod valuation;

// Re-export database utilities
pub use db::{
    create_pool, get_connection, init, run_migrations, spawn_writer, DbConnection, DbPool,
    WriteHandle,
};

// Re-export repositories
pub use positions::FundPositionRepository;
pub use profiles::ProfileRepository;
pub use snapshots::SnapshotRepository;
pub use valuation::ValuationRepository;

// Re-export storage errors and conversion helpers
pub use errors::{IntoCore, StorageError};

// Re-export from nestegg-core for convenience
pub use nestegg_core::errors::{DatabaseError, Error, Result};
