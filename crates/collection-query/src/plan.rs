//! SQL rendering for collection listings.
//!
//! A [`QueryPlan`] holds the page statement, the count statement and the
//! bound values for each. Identifiers in the SQL text come only from the
//! [`CollectionSpec`]; everything taken from the request is a bound value.
//!
//! For the reviews collection the page statement looks like:
//!
//! ```sql
//! SELECT "reviews"."owner", ..., COUNT("comments"."comment_id") AS "comment_count"
//! FROM "reviews"
//! LEFT JOIN "comments" ON "comments"."review_id" = "reviews"."review_id"
//! WHERE "reviews"."category" = $1
//! GROUP BY "reviews"."review_id"
//! ORDER BY "comment_count" ASC, "reviews"."review_id" ASC
//! LIMIT $2 OFFSET $3
//! ```
//!
//! and the count statement applies the same `WHERE` clause:
//!
//! ```sql
//! SELECT COUNT(*) AS "count" FROM "reviews" WHERE "reviews"."category" = $1
//! ```

use serde_json::Value as JsonValue;
use tracing::trace;

use crate::collection::{CollectionRequest, CollectionSpec};
use crate::config::QueryConfig;
use crate::pagination::PageWindow;
use crate::{Error, Result};

/// Column alias of the count statement's single result column.
pub const COUNT_ALIAS: &str = "count";

/// Rendered statements for one collection request. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
   sql: String,
   count_sql: String,
   params: Vec<JsonValue>,
   count_params: Vec<JsonValue>,
   window: PageWindow,
}

impl QueryPlan {
   /// Render the page and count statements for `request` against `spec`.
   ///
   /// Fails only when `spec` is scoped to a parent row and the request has
   /// no scope value.
   pub fn build(
      spec: &CollectionSpec,
      request: &CollectionRequest,
      config: &QueryConfig,
   ) -> Result<Self> {
      let mut conditions = Vec::new();
      let mut values = Vec::new();

      if let Some(column) = spec.scope {
         let scope = request.scope.clone().ok_or_else(|| Error::MissingScope {
            collection: spec.name.to_string(),
         })?;
         values.push(scope);
         conditions.push(format!("{} = ${}", column, values.len()));
      }

      for (column, value) in &request.filters {
         values.push(JsonValue::String(value.clone()));
         conditions.push(format!("{} = ${}", column, values.len()));
      }

      if let (Some(search), Some(text)) = (spec.search, request.search.as_deref()) {
         values.push(JsonValue::String(like_pattern(text)));
         conditions.push(format!(
            "{} LIKE ${} ESCAPE '\\'",
            search.column,
            values.len()
         ));
      }

      let where_clause = if conditions.is_empty() {
         String::new()
      } else {
         format!(" WHERE {}", conditions.join(" AND "))
      };

      let count_sql = format!(
         "SELECT COUNT(*) AS \"{COUNT_ALIAS}\" FROM {}{where_clause}",
         spec.table
      );
      let count_params = values.clone();

      let mut projection = spec
         .columns
         .iter()
         .map(|column| column.quoted())
         .collect::<Vec<_>>();
      let mut from = spec.table.quoted();
      let mut group_by = String::new();

      if let Some(child) = spec.child_count {
         projection.push(format!("COUNT({}) AS {}", child.counted, child.alias));
         from.push_str(&format!(
            " LEFT JOIN {} ON {} = {}",
            child.table, child.foreign_key, spec.primary_key
         ));
         group_by = format!(" GROUP BY {}", spec.primary_key);
      }

      let sort = request.sort.unwrap_or(spec.default_sort);
      let direction = request.direction.unwrap_or(config.default_direction);
      let mut order_by = format!(" ORDER BY {} {}", sort, direction.as_sql());
      if sort != spec.primary_key {
         order_by.push_str(&format!(", {} ASC", spec.primary_key));
      }

      let window = request.window(config);
      values.push(JsonValue::from(window.limit_i64()));
      let limit_index = values.len();
      values.push(JsonValue::from(window.offset_i64()));
      let offset_index = values.len();

      let sql = format!(
         "SELECT {} FROM {from}{where_clause}{group_by}{order_by} LIMIT ${limit_index} OFFSET ${offset_index}",
         projection.join(", ")
      );

      trace!(collection = spec.name, %sql, %count_sql, "built collection query");

      Ok(Self {
         sql,
         count_sql,
         params: values,
         count_params,
         window,
      })
   }

   /// The page statement.
   pub fn sql(&self) -> &str {
      &self.sql
   }

   /// The count statement.
   pub fn count_sql(&self) -> &str {
      &self.count_sql
   }

   /// Values bound to the page statement, in placeholder order.
   pub fn params(&self) -> &[JsonValue] {
      &self.params
   }

   /// Values bound to the count statement, in placeholder order.
   pub fn count_params(&self) -> &[JsonValue] {
      &self.count_params
   }

   /// The pagination window rendered into `LIMIT`/`OFFSET`.
   pub fn window(&self) -> PageWindow {
      self.window
   }
}

/// Render a list query for `request`. See [`QueryPlan::build`].
pub fn build_list_query(
   spec: &CollectionSpec,
   request: &CollectionRequest,
   config: &QueryConfig,
) -> Result<QueryPlan> {
   QueryPlan::build(spec, request, config)
}

/// Wrap `text` as a `%text%` pattern, escaping `LIKE` wildcards with `\`.
pub fn like_pattern(text: &str) -> String {
   let mut pattern = String::with_capacity(text.len() + 2);
   pattern.push('%');
   for c in text.chars() {
      if matches!(c, '%' | '_' | '\\') {
         pattern.push('\\');
      }
      pattern.push(c);
   }
   pattern.push('%');
   pattern
}
