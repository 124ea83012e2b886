//! SQLite database with connection pooling and a single serialized writer

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use tracing::debug;

use crate::config::SqliteDatabaseConfig;
use crate::error::{Error, Result};
use crate::write_guard::WriteGuard;

/// SQLite database with connection pooling for concurrent reads and exclusive writes.
///
/// ## Architecture
///
/// The database maintains two connection pools:
/// - **`read_pool`**: Pool of read-only connections for concurrent reads
/// - **`write_conn`**: Single-connection pool for exclusive write access (enforced by max_connections=1)
///
/// Collection listings issue their count and page queries on the read pool
/// concurrently. Every mutation, including the multi-statement like toggle,
/// goes through the single writer, so write statements never interleave.
///
/// ## Usage Pattern
///
/// ```text
/// 1. Connect to database (creates the file when missing)
/// 2. Read operations: Access read_pool for concurrent reads
/// 3. Write operations: Acquire writer (lazily enables WAL on first call)
/// 4. Close database when done
/// ```
#[derive(Debug)]
pub struct SqliteDatabase {
   /// Pool of read-only connections for concurrent reads
   read_pool: Pool<Sqlite>,

   /// Single read-write connection pool (max_connections=1) for serialized writes
   write_conn: Pool<Sqlite>,

   /// Tracks if WAL mode has been initialized (set on first write)
   wal_initialized: AtomicBool,

   /// Marks database as closed to prevent further operations
   closed: AtomicBool,

   /// Path to database file (used for cleanup)
   path: PathBuf,
}

impl SqliteDatabase {
   /// Open (or create) the database file at `path`.
   ///
   /// The write pool connects eagerly so the file exists before any read-only
   /// connection tries to open it. Read connections are created on demand.
   pub async fn connect(
      path: impl AsRef<Path>,
      custom_config: Option<SqliteDatabaseConfig>,
   ) -> Result<Arc<Self>> {
      let path = path.as_ref().to_path_buf();
      if path.as_os_str().is_empty() {
         return Err(Error::InvalidPath(path));
      }

      let config = custom_config.unwrap_or_default();

      let write_options = SqliteConnectOptions::new()
         .filename(&path)
         .create_if_missing(true)
         .foreign_keys(true)
         .busy_timeout(config.busy_timeout);

      let write_conn = SqlitePoolOptions::new()
         .max_connections(1)
         .idle_timeout(config.idle_timeout)
         .connect_with(write_options)
         .await?;

      let read_options = SqliteConnectOptions::new()
         .filename(&path)
         .read_only(true)
         .foreign_keys(true)
         .busy_timeout(config.busy_timeout);

      let read_pool = SqlitePoolOptions::new()
         .max_connections(config.max_read_connections.max(1))
         .idle_timeout(config.idle_timeout)
         .connect_lazy_with(read_options);

      debug!(
         "Opened database at {} (max_read_connections={})",
         path.display(),
         config.max_read_connections
      );

      Ok(Arc::new(Self {
         read_pool,
         write_conn,
         wal_initialized: AtomicBool::new(false),
         closed: AtomicBool::new(false),
         path,
      }))
   }

   /// Pool of read-only connections.
   pub fn read_pool(&self) -> Result<&Pool<Sqlite>> {
      self.ensure_open()?;
      Ok(&self.read_pool)
   }

   /// Acquire the single write connection.
   ///
   /// The first call switches the database to WAL journal mode so readers
   /// are not blocked while a write is in progress.
   pub async fn acquire_writer(&self) -> Result<WriteGuard> {
      self.ensure_open()?;

      let mut conn = self.write_conn.acquire().await?;

      if !self.wal_initialized.load(Ordering::Acquire) {
         sqlx::query("PRAGMA journal_mode = WAL")
            .execute(&mut *conn)
            .await?;
         self.wal_initialized.store(true, Ordering::Release);
         debug!("Enabled WAL journal mode for {}", self.path.display());
      }

      Ok(WriteGuard::new(conn))
   }

   /// Path of the database file.
   pub fn path(&self) -> &Path {
      &self.path
   }

   /// Whether [`close`](Self::close) has been called.
   pub fn is_closed(&self) -> bool {
      self.closed.load(Ordering::Acquire)
   }

   /// Close both pools. Further use returns [`Error::DatabaseClosed`].
   pub async fn close(&self) -> Result<()> {
      if self.closed.swap(true, Ordering::AcqRel) {
         return Ok(());
      }

      self.read_pool.close().await;
      self.write_conn.close().await;
      debug!("Closed database at {}", self.path.display());
      Ok(())
   }

   /// Close the database and delete its file along with the WAL and shared
   /// memory side files.
   pub async fn remove(&self) -> Result<()> {
      self.close().await?;

      for file in [
         self.path.clone(),
         sibling(&self.path, "-wal"),
         sibling(&self.path, "-shm"),
      ] {
         match tokio::fs::remove_file(&file).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
         }
      }

      debug!("Removed database files for {}", self.path.display());
      Ok(())
   }

   fn ensure_open(&self) -> Result<()> {
      if self.is_closed() {
         return Err(Error::DatabaseClosed);
      }
      Ok(())
   }
}

/// `path` with `suffix` appended to the file name (`reviews.db` -> `reviews.db-wal`).
fn sibling(path: &Path, suffix: &str) -> PathBuf {
   let mut name = OsString::from(path.as_os_str());
   name.push(suffix);
   PathBuf::from(name)
}
