//! Table-parametric row helpers.
//!
//! Table and column names are [`Ident`]s, so they can only come from
//! allow-list constants. Every value is bound.

use serde::Serialize;
use serde_json::Value as JsonValue;
use sqlx::Row as _;
use tracing::debug;

use crate::builders::decode_rows;
use crate::ident::Ident;
use crate::pagination::PageWindow;
use crate::wrapper::{DatabaseWrapper, begin, bind_values, finish};
use crate::{Error, Result, Row};

/// Column adjusted by [`DatabaseWrapper::update_vote_counter`].
pub const VOTES_COLUMN: Ident = Ident::new("votes");

/// Outcome of [`DatabaseWrapper::toggle_pair`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "row", rename_all = "camelCase")]
pub enum Toggle {
   /// The pair was absent and has been inserted
   Added(Row),
   /// The pair was present and has been deleted
   Removed,
   /// A concurrent writer inserted the pair first; nothing changed
   Unchanged,
}

impl DatabaseWrapper {
   /// One page of the rows of `table` where `column = value`, ascending by
   /// `order_by`.
   pub async fn select_page(
      &self,
      table: Ident,
      column: Ident,
      value: impl Into<JsonValue>,
      order_by: Ident,
      window: PageWindow,
   ) -> Result<Vec<Row>> {
      let query = format!(
         "SELECT * FROM {table} WHERE {column} = $1 ORDER BY {order_by} ASC LIMIT $2 OFFSET $3"
      );
      self
         .fetch_all(
            query,
            vec![
               value.into(),
               JsonValue::from(window.limit_i64()),
               JsonValue::from(window.offset_i64()),
            ],
         )
         .await
   }

   /// The single row of `table` where `column = value`.
   pub async fn select_one(
      &self,
      table: Ident,
      column: Ident,
      value: impl Into<JsonValue>,
   ) -> Result<Option<Row>> {
      let query = format!("SELECT * FROM {table} WHERE {column} = $1");
      self.fetch_one(query, vec![value.into()]).await
   }

   /// Number of rows of `table` where `column = value`.
   pub async fn count_where(
      &self,
      table: Ident,
      column: Ident,
      value: impl Into<JsonValue>,
   ) -> Result<i64> {
      let query = format!("SELECT COUNT(*) AS \"count\" FROM {table} WHERE {column} = $1");
      let row = self.fetch_one(query, vec![value.into()]).await?;
      Ok(row
         .and_then(|row| row.get("count").and_then(JsonValue::as_i64))
         .unwrap_or(0))
   }

   /// Whether any row of `table` has `column = value`.
   pub async fn exists(
      &self,
      table: Ident,
      column: Ident,
      value: impl Into<JsonValue>,
   ) -> Result<bool> {
      let query = format!("SELECT 1 AS \"found\" FROM {table} WHERE {column} = $1 LIMIT 1");
      let rows = self.fetch_all(query, vec![value.into()]).await?;
      Ok(!rows.is_empty())
   }

   /// Insert one row and return it as stored.
   ///
   /// With no columns the row is built from column defaults.
   pub async fn insert(&self, table: Ident, columns: &[Ident], values: Vec<JsonValue>) -> Result<Row> {
      if columns.len() != values.len() {
         return Err(Error::ColumnValueMismatch {
            columns: columns.len(),
            values: values.len(),
         });
      }

      let query = if columns.is_empty() {
         format!("INSERT INTO {table} DEFAULT VALUES RETURNING *")
      } else {
         let names = columns
            .iter()
            .map(Ident::quoted)
            .collect::<Vec<_>>()
            .join(", ");
         let placeholders = (1..=columns.len())
            .map(|i| format!("${i}"))
            .collect::<Vec<_>>()
            .join(", ");
         format!("INSERT INTO {table} ({names}) VALUES ({placeholders}) RETURNING *")
      };

      self
         .execute_returning(query, values)
         .await?
         .into_iter()
         .next()
         .ok_or(Error::Sqlx(sqlx::Error::RowNotFound))
   }

   /// Add `delta` (which may be negative) to the `votes` column of one row.
   ///
   /// Returns `None` when no row has `id_column = id_value`. A total outside
   /// the `i64` range fails with [`Error::CounterOverflow`] and leaves the row
   /// unchanged.
   pub async fn update_vote_counter(
      &self,
      table: Ident,
      delta: i64,
      id_column: Ident,
      id_value: impl Into<JsonValue>,
   ) -> Result<Option<Row>> {
      let id_value = id_value.into();

      let mut writer = self.acquire_writer().await?;
      let mut tx = begin(&mut writer).await?;

      let result = async {
         let select = format!("SELECT {VOTES_COLUMN} FROM {table} WHERE {id_column} = $1");
         let Some(row) = bind_values(sqlx::query(&select), [id_value.clone()])
            .fetch_optional(&mut *tx)
            .await?
         else {
            return Ok(None);
         };
         let current: i64 = row.try_get(0)?;
         let total = current
            .checked_add(delta)
            .ok_or(Error::CounterOverflow { current, delta })?;

         let update = format!(
            "UPDATE {table} SET {VOTES_COLUMN} = $1 WHERE {id_column} = $2 RETURNING *"
         );
         let rows = bind_values(sqlx::query(&update), [JsonValue::from(total), id_value])
            .fetch_all(&mut *tx)
            .await?;
         Ok::<_, Error>(decode_rows(rows)?.into_iter().next())
      }
      .await;

      finish(tx, result).await
   }

   /// Replace several columns' values on matching rows in one statement and
   /// return the updated rows.
   ///
   /// With no changes the matching rows are returned as they are.
   pub async fn update_columns(
      &self,
      table: Ident,
      changes: Vec<(Ident, JsonValue)>,
      id_column: Ident,
      id_value: impl Into<JsonValue>,
   ) -> Result<Vec<Row>> {
      if changes.is_empty() {
         let query = format!("SELECT * FROM {table} WHERE {id_column} = $1");
         return self.fetch_all(query, vec![id_value.into()]).await;
      }

      let assignments = changes
         .iter()
         .enumerate()
         .map(|(i, (column, _))| format!("{column} = ${}", i + 1))
         .collect::<Vec<_>>()
         .join(", ");
      let query = format!(
         "UPDATE {table} SET {assignments} WHERE {id_column} = ${} RETURNING *",
         changes.len() + 1
      );

      let mut values = changes.into_iter().map(|(_, value)| value).collect::<Vec<_>>();
      values.push(id_value.into());
      self.execute_returning(query, values).await
   }

   /// Replace one column's value on matching rows and return them.
   pub async fn update_column(
      &self,
      table: Ident,
      column: Ident,
      value: impl Into<JsonValue>,
      id_column: Ident,
      id_value: impl Into<JsonValue>,
   ) -> Result<Vec<Row>> {
      let query = format!("UPDATE {table} SET {column} = $1 WHERE {id_column} = $2 RETURNING *");
      self
         .execute_returning(query, vec![value.into(), id_value.into()])
         .await
   }

   /// Delete matching rows, returning how many were removed.
   ///
   /// Deleting a missing row is not an error.
   pub async fn delete_row(
      &self,
      table: Ident,
      id_column: Ident,
      id_value: impl Into<JsonValue>,
   ) -> Result<u64> {
      let query = format!("DELETE FROM {table} WHERE {id_column} = $1");
      let result = self.execute(query, vec![id_value.into()]).await?;
      Ok(result.rows_affected)
   }

   /// Delete the `(first, second)` pair from a join table if present,
   /// otherwise insert it.
   ///
   /// Runs as one `BEGIN IMMEDIATE` transaction on the writer. The insert uses
   /// `ON CONFLICT DO NOTHING`, so a unique constraint on the pair keeps the
   /// table free of duplicates even for writers outside this process.
   pub async fn toggle_pair(
      &self,
      table: Ident,
      first: (Ident, JsonValue),
      second: (Ident, JsonValue),
   ) -> Result<Toggle> {
      let (first_column, first_value) = first;
      let (second_column, second_value) = second;

      let mut writer = self.acquire_writer().await?;
      let mut tx = begin(&mut writer).await?;

      let result = async {
         let delete = format!("DELETE FROM {table} WHERE {first_column} = $1 AND {second_column} = $2");
         let removed = bind_values(
            sqlx::query(&delete),
            [first_value.clone(), second_value.clone()],
         )
         .execute(&mut *tx)
         .await?;

         if removed.rows_affected() > 0 {
            return Ok(Toggle::Removed);
         }

         let insert = format!(
            "INSERT INTO {table} ({first_column}, {second_column}) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING RETURNING *"
         );
         let rows = bind_values(sqlx::query(&insert), [first_value, second_value])
            .fetch_all(&mut *tx)
            .await?;

         Ok::<_, Error>(match decode_rows(rows)?.into_iter().next() {
            Some(row) => Toggle::Added(row),
            None => Toggle::Unchanged,
         })
      }
      .await;

      let toggle = finish(tx, result).await?;
      debug!(table = table.as_str(), ?toggle, "toggled pair");
      Ok(toggle)
   }
}

#[cfg(test)]
mod tests {
   use std::time::Duration;

   use serde_json::json;
   use tempfile::TempDir;

   use super::*;

   const GAMES: Ident = Ident::new("games");
   const GAME_ID: Ident = Ident::new("game_id");
   const TITLE: Ident = Ident::new("title");
   const SHELF: Ident = Ident::new("shelf");
   const FAVOURITES: Ident = Ident::new("favourites");
   const PLAYER: Ident = Ident::new("player");

   async fn create_test_db() -> (DatabaseWrapper, TempDir) {
      let temp_dir = TempDir::new().expect("Failed to create temp directory");
      let db = DatabaseWrapper::connect(temp_dir.path().join("crud.db"), None)
         .await
         .expect("Failed to connect to test database");

      db.execute_transaction(vec![
         (
            "CREATE TABLE games (game_id INTEGER PRIMARY KEY, title TEXT NOT NULL DEFAULT 'untitled', shelf TEXT, votes INTEGER NOT NULL DEFAULT 0)".into(),
            vec![],
         ),
         (
            "CREATE TABLE favourites (favourite_id INTEGER PRIMARY KEY, player TEXT NOT NULL, game_id INTEGER NOT NULL, UNIQUE (player, game_id))".into(),
            vec![],
         ),
      ])
      .await
      .expect("Failed to create tables");

      (db, temp_dir)
   }

   async fn add_game(db: &DatabaseWrapper, title: &str, shelf: &str) -> Row {
      db.insert(GAMES, &[TITLE, SHELF], vec![json!(title), json!(shelf)])
         .await
         .unwrap()
   }

   #[tokio::test]
   async fn test_insert_returns_stored_row() {
      let (db, _temp) = create_test_db().await;

      let row = add_game(&db, "Agricola", "euro").await;
      assert_eq!(row.get("game_id"), Some(&json!(1)));
      assert_eq!(row.get("title"), Some(&json!("Agricola")));
      assert_eq!(row.get("votes"), Some(&json!(0)));

      let row = db.insert(GAMES, &[], vec![]).await.unwrap();
      assert_eq!(row.get("title"), Some(&json!("untitled")));

      db.remove().await.unwrap();
   }

   #[tokio::test]
   async fn test_insert_rejects_mismatched_values() {
      let (db, _temp) = create_test_db().await;

      let err = db
         .insert(GAMES, &[TITLE], vec![json!("a"), json!("b")])
         .await
         .unwrap_err();
      assert!(matches!(
         err,
         Error::ColumnValueMismatch {
            columns: 1,
            values: 2
         }
      ));

      db.remove().await.unwrap();
   }

   #[tokio::test]
   async fn test_select_page_and_counts() {
      let (db, _temp) = create_test_db().await;
      for title in ["a", "b", "c", "d", "e"] {
         add_game(&db, title, "party").await;
      }
      add_game(&db, "f", "euro").await;

      let page = db
         .select_page(
            GAMES,
            SHELF,
            "party",
            GAME_ID,
            PageWindow { limit: 2, offset: 2 },
         )
         .await
         .unwrap();
      let titles: Vec<_> = page.iter().map(|r| r["title"].clone()).collect();
      assert_eq!(titles, vec![json!("c"), json!("d")]);

      assert_eq!(db.count_where(GAMES, SHELF, "party").await.unwrap(), 5);
      assert_eq!(db.count_where(GAMES, SHELF, "abstract").await.unwrap(), 0);
      assert!(db.exists(GAMES, SHELF, "euro").await.unwrap());
      assert!(!db.exists(GAMES, SHELF, "abstract").await.unwrap());

      let row = db.select_one(GAMES, GAME_ID, 6).await.unwrap().unwrap();
      assert_eq!(row["title"], json!("f"));
      assert!(db.select_one(GAMES, GAME_ID, 60).await.unwrap().is_none());

      db.remove().await.unwrap();
   }

   #[tokio::test]
   async fn test_update_vote_counter() {
      let (db, _temp) = create_test_db().await;
      add_game(&db, "Jenga", "dexterity").await;

      let row = db
         .update_vote_counter(GAMES, 5, GAME_ID, 1)
         .await
         .unwrap()
         .unwrap();
      assert_eq!(row["votes"], json!(5));

      let row = db
         .update_vote_counter(GAMES, -8, GAME_ID, 1)
         .await
         .unwrap()
         .unwrap();
      assert_eq!(row["votes"], json!(-3));

      assert!(
         db.update_vote_counter(GAMES, 1, GAME_ID, 99)
            .await
            .unwrap()
            .is_none()
      );

      db.remove().await.unwrap();
   }

   #[tokio::test]
   async fn test_update_vote_counter_rejects_overflow() {
      let (db, _temp) = create_test_db().await;
      add_game(&db, "Scythe", "euro").await;
      db.update_vote_counter(GAMES, 100, GAME_ID, 1).await.unwrap();

      let err = db
         .update_vote_counter(GAMES, i64::MAX, GAME_ID, 1)
         .await
         .unwrap_err();
      assert!(matches!(
         err,
         Error::CounterOverflow {
            current: 100,
            delta: i64::MAX
         }
      ));
      assert_eq!(err.status_code(), 400);

      let row = db.select_one(GAMES, GAME_ID, 1).await.unwrap().unwrap();
      assert_eq!(row["votes"], json!(100));

      // The writer is usable again after the rejected change
      let row = db
         .update_vote_counter(GAMES, i64::MAX - 100, GAME_ID, 1)
         .await
         .unwrap()
         .unwrap();
      assert_eq!(row["votes"], json!(i64::MAX));

      db.remove().await.unwrap();
   }

   #[tokio::test]
   async fn test_update_columns_in_one_statement() {
      let (db, _temp) = create_test_db().await;
      add_game(&db, "Jenga", "dexterity").await;

      let rows = db
         .update_columns(
            GAMES,
            vec![(TITLE, json!("Jenga Giant")), (SHELF, json!("party"))],
            GAME_ID,
            1,
         )
         .await
         .unwrap();
      assert_eq!(rows.len(), 1);
      assert_eq!(rows[0]["title"], json!("Jenga Giant"));
      assert_eq!(rows[0]["shelf"], json!("party"));

      // A failing column leaves the others untouched
      let err = db
         .update_columns(
            GAMES,
            vec![(SHELF, json!("abstract")), (TITLE, JsonValue::Null)],
            GAME_ID,
            1,
         )
         .await;
      assert!(err.is_err());
      let row = db.select_one(GAMES, GAME_ID, 1).await.unwrap().unwrap();
      assert_eq!(row["shelf"], json!("party"));

      let unchanged = db.update_columns(GAMES, vec![], GAME_ID, 1).await.unwrap();
      assert_eq!(unchanged[0]["title"], json!("Jenga Giant"));
      assert!(
         db.update_columns(GAMES, vec![(TITLE, json!("x"))], GAME_ID, 9)
            .await
            .unwrap()
            .is_empty()
      );

      db.remove().await.unwrap();
   }

   #[tokio::test]
   async fn test_update_column_binds_value() {
      let (db, _temp) = create_test_db().await;
      add_game(&db, "Jenga", "dexterity").await;

      let hostile = "x'; DROP TABLE games; --";
      let rows = db
         .update_column(GAMES, TITLE, hostile, GAME_ID, 1)
         .await
         .unwrap();
      assert_eq!(rows.len(), 1);
      assert_eq!(rows[0]["title"], json!(hostile));
      assert!(db.exists(GAMES, GAME_ID, 1).await.unwrap());

      db.remove().await.unwrap();
   }

   #[tokio::test]
   async fn test_delete_row_is_idempotent() {
      let (db, _temp) = create_test_db().await;
      add_game(&db, "Jenga", "dexterity").await;

      assert_eq!(db.delete_row(GAMES, GAME_ID, 1).await.unwrap(), 1);
      assert_eq!(db.delete_row(GAMES, GAME_ID, 1).await.unwrap(), 0);

      db.remove().await.unwrap();
   }

   #[tokio::test]
   async fn test_toggle_pair_alternates() {
      let (db, _temp) = create_test_db().await;
      let pair = || {
         (
            (PLAYER, json!("mallionaire")),
            (GAME_ID, json!(3)),
         )
      };

      for round in 0..5 {
         let (first, second) = pair();
         let toggle = db.toggle_pair(FAVOURITES, first, second).await.unwrap();
         if round % 2 == 0 {
            match toggle {
               Toggle::Added(row) => {
                  assert_eq!(row["player"], json!("mallionaire"));
                  assert_eq!(row["game_id"], json!(3));
               }
               other => panic!("expected Added, got {other:?}"),
            }
         } else {
            assert_eq!(toggle, Toggle::Removed);
         }
      }

      // Odd number of toggles leaves exactly one row
      assert_eq!(
         db.count_where(FAVOURITES, PLAYER, "mallionaire")
            .await
            .unwrap(),
         1
      );

      db.remove().await.unwrap();
   }

   #[tokio::test]
   async fn test_toggle_after_cancelled_transaction() {
      let (db, _temp) = create_test_db().await;

      let statements = (0..20_000)
         .map(|i| {
            (
               "INSERT INTO games (title) VALUES ($1)".to_string(),
               vec![json!(format!("game {i}"))],
            )
         })
         .collect::<Vec<_>>();
      let _ = tokio::time::timeout(
         Duration::from_millis(20),
         db.execute_transaction(statements),
      )
      .await;

      let toggle = db
         .toggle_pair(FAVOURITES, (PLAYER, json!("dav3rid")), (GAME_ID, json!(2)))
         .await
         .unwrap();
      assert!(matches!(toggle, Toggle::Added(_)));
      assert!(db.exists(FAVOURITES, PLAYER, "dav3rid").await.unwrap());

      let added = add_game(&db, "Catan", "euro").await;
      assert!(db.exists(GAMES, GAME_ID, added["game_id"].clone()).await.unwrap());

      db.remove().await.unwrap();
   }

   #[tokio::test]
   async fn test_concurrent_toggles_never_duplicate() {
      let (db, _temp) = create_test_db().await;

      let mut handles = Vec::new();
      for _ in 0..8 {
         let db = db.clone();
         handles.push(tokio::spawn(async move {
            db.toggle_pair(
               FAVOURITES,
               (PLAYER, json!("bainesface")),
               (GAME_ID, json!(1)),
            )
            .await
         }));
      }
      for handle in handles {
         handle.await.unwrap().unwrap();
      }

      // Eight serialized toggles cancel out
      assert_eq!(
         db.count_where(FAVOURITES, PLAYER, "bainesface")
            .await
            .unwrap(),
         0
      );

      db.remove().await.unwrap();
   }
}
