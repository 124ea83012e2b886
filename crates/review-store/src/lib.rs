//! # review-store
//!
//! Pooled SQLite access for the game reviews backend.
//!
//! ## Core Types
//!
//! - **[`SqliteDatabase`]**: Database with separate read and write connection pools
//! - **[`SqliteDatabaseConfig`]**: Configuration for connection pool settings
//! - **[`WriteGuard`]**: RAII guard ensuring exclusive write access
//! - **[`Error`]**: Error type for database operations
//!
//! ## Architecture
//!
//! - **Dual pools**: Separate read-only pool (default 6 connections) and write pool (1 connection)
//! - **Lazy WAL mode**: Write-Ahead Logging enabled automatically on first write
//! - **Exclusive writes**: Single-connection write pool enforces serialized write access
//! - **Concurrent reads**: Count and page queries of one listing can run side by side

mod config;
mod database;
mod error;
mod write_guard;

// Re-export public types
pub use config::SqliteDatabaseConfig;
pub use database::SqliteDatabase;
pub use error::{Error, Result};
pub use write_guard::WriteGuard;
