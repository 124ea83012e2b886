//! RAII guard for the single write connection

use std::ops::{Deref, DerefMut};

use sqlx::Sqlite;
use sqlx::pool::PoolConnection;
use sqlx::sqlite::SqliteConnection;

/// Exclusive access to the database's write connection.
///
/// Only one guard exists at a time; the connection returns to the write pool
/// when the guard is dropped. Dereferences to [`SqliteConnection`], so it can
/// be used anywhere sqlx expects an executor via `&mut *guard`.
#[must_use = "dropping the guard releases the write connection immediately"]
#[derive(Debug)]
pub struct WriteGuard {
   conn: PoolConnection<Sqlite>,
}

impl WriteGuard {
   pub(crate) fn new(conn: PoolConnection<Sqlite>) -> Self {
      Self { conn }
   }
}

impl Deref for WriteGuard {
   type Target = SqliteConnection;

   fn deref(&self) -> &Self::Target {
      &self.conn
   }
}

impl DerefMut for WriteGuard {
   fn deref_mut(&mut self) -> &mut Self::Target {
      &mut self.conn
   }
}
