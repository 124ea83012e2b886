//! Error types for review-store

use std::path::PathBuf;

use thiserror::Error;

/// Errors that may occur when working with the review store
#[derive(Error, Debug)]
pub enum Error {
   /// IO error when accessing database files. Standard library IO errors
   /// are converted to this variant.
   #[error("IO error: {0}")]
   Io(#[from] std::io::Error),

   /// Error from the sqlx library. Standard sqlx errors are converted to this variant
   #[error("Sqlx error: {0}")]
   Sqlx(#[from] sqlx::Error),

   /// Database has been closed and cannot be used
   #[error("Database has been closed")]
   DatabaseClosed,

   /// Database path cannot be used as a SQLite file location
   #[error("invalid database path: {}", .0.display())]
   InvalidPath(PathBuf),
}

/// A type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
