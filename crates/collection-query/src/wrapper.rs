use std::path::Path;
use std::sync::Arc;

use review_store::{SqliteDatabase, SqliteDatabaseConfig, WriteGuard};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::sqlite::SqliteArguments;
use sqlx::{Connection, Executor, Sqlite, Transaction};

use crate::builders::{FetchCollectionBuilder, decode_rows};
use crate::collection::{CollectionRequest, CollectionSpec};
use crate::config::QueryConfig;
use crate::{Error, Result, Row};

/// Result returned from write operations (e.g. INSERT, UPDATE, DELETE).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteQueryResult {
   /// The number of rows affected by the write operation.
   pub rows_affected: u64,
   /// The last inserted row ID (SQLite ROWID).
   pub last_insert_id: i64,
}

/// A [`SqliteDatabase`] paired with the engine's query defaults.
///
/// Reads go through the read-only pool; writes go through the single writer.
/// Cloning is cheap and shares the underlying pools.
#[derive(Clone)]
pub struct DatabaseWrapper {
   inner: Arc<SqliteDatabase>,
   config: QueryConfig,
}

impl DatabaseWrapper {
   /// Open (creating if missing) the database at `path`.
   pub async fn connect(
      path: impl AsRef<Path>,
      custom_config: Option<SqliteDatabaseConfig>,
   ) -> Result<Self> {
      let db = SqliteDatabase::connect(path, custom_config).await?;
      Ok(Self::from_database(db))
   }

   /// Wrap an already connected database with the default query settings.
   pub fn from_database(db: Arc<SqliteDatabase>) -> Self {
      Self {
         inner: db,
         config: QueryConfig::default(),
      }
   }

   /// Replace the query defaults used by [`fetch_collection`](Self::fetch_collection).
   pub fn with_query_config(mut self, config: QueryConfig) -> Self {
      self.config = config;
      self
   }

   pub fn query_config(&self) -> &QueryConfig {
      &self.config
   }

   /// Start a listing of `spec` for a validated request.
   ///
   /// Await the builder to run the count and page statements.
   pub fn fetch_collection(
      &self,
      spec: &'static CollectionSpec,
      request: CollectionRequest,
   ) -> FetchCollectionBuilder {
      FetchCollectionBuilder::new(Arc::clone(&self.inner), spec, request, self.config.clone())
   }

   /// Execute a write statement (INSERT/UPDATE/DELETE/DDL)
   pub async fn execute(&self, query: String, values: Vec<JsonValue>) -> Result<WriteQueryResult> {
      let mut writer = self.acquire_writer().await?;
      let result = bind_values(sqlx::query(&query), values)
         .execute(&mut *writer)
         .await?;

      Ok(WriteQueryResult {
         rows_affected: result.rows_affected(),
         last_insert_id: result.last_insert_rowid(),
      })
   }

   /// Execute write statements atomically.
   ///
   /// The writer is held from `BEGIN IMMEDIATE` until `COMMIT`; any failing
   /// statement rolls the whole batch back. Dropping the future before it
   /// completes also rolls back, so the writer never returns to the pool
   /// inside an open transaction.
   pub async fn execute_transaction(
      &self,
      statements: Vec<(String, Vec<JsonValue>)>,
   ) -> Result<Vec<WriteQueryResult>> {
      let mut writer = self.acquire_writer().await?;
      let mut tx = begin(&mut writer).await?;

      let result = async {
         let mut results = Vec::with_capacity(statements.len());
         for (query, values) in statements {
            let exec_result = bind_values(sqlx::query(&query), values)
               .execute(&mut *tx)
               .await?;
            results.push(WriteQueryResult {
               rows_affected: exec_result.rows_affected(),
               last_insert_id: exec_result.last_insert_rowid(),
            });
         }
         Ok::<_, Error>(results)
      }
      .await;

      finish(tx, result).await
   }

   /// Execute a write statement with a `RETURNING` clause and decode the rows.
   pub async fn execute_returning(&self, query: String, values: Vec<JsonValue>) -> Result<Vec<Row>> {
      let mut writer = self.acquire_writer().await?;
      let rows = bind_values(sqlx::query(&query), values)
         .fetch_all(&mut *writer)
         .await?;
      decode_rows(rows)
   }

   /// Execute a SELECT statement, possibly returning multiple rows
   pub async fn fetch_all(&self, query: String, values: Vec<JsonValue>) -> Result<Vec<Row>> {
      let pool = self.inner.read_pool()?;
      let rows = pool.fetch_all(bind_values(sqlx::query(&query), values)).await?;
      decode_rows(rows)
   }

   /// Execute a SELECT statement expecting zero or one row
   pub async fn fetch_one(&self, query: String, values: Vec<JsonValue>) -> Result<Option<Row>> {
      let pool = self.inner.read_pool()?;

      // Two rows are enough to tell "one" from "many"
      let limited_query = format!("{} LIMIT 2", query.trim_end_matches(';'));
      let rows = pool
         .fetch_all(bind_values(sqlx::query(&limited_query), values))
         .await?;

      match rows.len() {
         0 | 1 => Ok(decode_rows(rows)?.into_iter().next()),
         count => Err(Error::MultipleRowsReturned(count)),
      }
   }

   pub(crate) async fn acquire_writer(&self) -> Result<WriteGuard> {
      Ok(self.inner.acquire_writer().await?)
   }

   /// The underlying database.
   pub fn inner(&self) -> &Arc<SqliteDatabase> {
      &self.inner
   }

   /// Close the database connections
   pub async fn close(self) -> Result<()> {
      self.inner.close().await?;
      Ok(())
   }

   /// Close the database connections and remove all database files
   pub async fn remove(self) -> Result<()> {
      self.inner.remove().await?;
      Ok(())
   }
}

pub(crate) type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

/// Bind JSON values to a query in placeholder order.
pub(crate) fn bind_values<'q>(
   mut query: SqliteQuery<'q>,
   values: impl IntoIterator<Item = JsonValue>,
) -> SqliteQuery<'q> {
   for value in values {
      query = bind_value(query, value);
   }
   query
}

/// Bind one JSON value, keeping integer precision where SQLite allows it.
pub(crate) fn bind_value(query: SqliteQuery<'_>, value: JsonValue) -> SqliteQuery<'_> {
   match value {
      JsonValue::Null => query.bind(None::<String>),
      JsonValue::Bool(flag) => query.bind(flag),
      JsonValue::String(text) => query.bind(text),
      JsonValue::Number(number) => {
         if let Some(int_val) = number.as_i64() {
            query.bind(int_val)
         } else if let Some(uint_val) = number.as_u64() {
            // Larger than i64::MAX; SQLite can only hold it as a REAL
            query.bind(uint_val as f64)
         } else {
            query.bind(number.as_f64().unwrap_or_default())
         }
      }
      other => query.bind(other),
   }
}

/// Open a write transaction that takes the database lock up front.
///
/// The returned [`Transaction`] rolls back if it is dropped unfinished.
pub(crate) async fn begin(writer: &mut WriteGuard) -> Result<Transaction<'_, Sqlite>> {
   Ok(writer.begin_with("BEGIN IMMEDIATE").await?)
}

/// Commit on success, roll back on failure and hand back the original error.
pub(crate) async fn finish<T>(tx: Transaction<'_, Sqlite>, result: Result<T>) -> Result<T> {
   match result {
      Ok(value) => {
         tx.commit().await?;
         Ok(value)
      }
      Err(e) => match tx.rollback().await {
         Ok(()) => Err(e),
         Err(rollback_err) => Err(Error::TransactionRollbackFailed {
            transaction_error: e.to_string(),
            rollback_error: rollback_err.to_string(),
         }),
      },
   }
}
