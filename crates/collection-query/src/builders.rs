//! Awaitable collection listing

use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::sync::Arc;

use indexmap::IndexMap;
use review_store::SqliteDatabase;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row as _};
use tracing::{debug, trace};

use crate::collection::{CollectionRequest, CollectionSpec};
use crate::config::QueryConfig;
use crate::plan::{COUNT_ALIAS, QueryPlan};
use crate::wrapper::bind_values;
use crate::{Error, Row};

/// One page of a collection plus the total number of matching rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionPage {
   /// Rows of the requested page
   pub items: Vec<Row>,
   /// Rows matching the filters, ignoring pagination
   pub count: i64,
}

impl CollectionPage {
   /// Whether the filters matched no rows at all.
   pub fn is_empty(&self) -> bool {
      self.count == 0
   }
}

/// Builder for a filtered, sorted, paginated listing with its total count.
///
/// Created by [`DatabaseWrapper::fetch_collection`](crate::DatabaseWrapper::fetch_collection).
pub struct FetchCollectionBuilder {
   db: Arc<SqliteDatabase>,
   spec: &'static CollectionSpec,
   request: CollectionRequest,
   config: QueryConfig,
}

impl FetchCollectionBuilder {
   pub(crate) fn new(
      db: Arc<SqliteDatabase>,
      spec: &'static CollectionSpec,
      request: CollectionRequest,
      config: QueryConfig,
   ) -> Self {
      Self {
         db,
         spec,
         request,
         config,
      }
   }

   /// Restrict the listing to children of one parent row.
   pub fn within(mut self, value: impl Into<serde_json::Value>) -> Self {
      self.request = self.request.within(value);
      self
   }

   /// Render the statements without running them.
   pub fn plan(&self) -> Result<QueryPlan, Error> {
      QueryPlan::build(self.spec, &self.request, &self.config)
   }

   /// Run the count and page statements concurrently on the read pool.
   pub async fn execute(self) -> Result<CollectionPage, Error> {
      let plan = self.plan()?;
      let pool = self.db.read_pool()?;

      trace!(collection = self.spec.name, params = ?plan.params(), "fetching collection");

      let count_query = bind_values(sqlx::query(plan.count_sql()), plan.count_params().to_vec());
      let page_query = bind_values(sqlx::query(plan.sql()), plan.params().to_vec());

      let (count_row, rows) = tokio::try_join!(count_query.fetch_one(pool), page_query.fetch_all(pool))?;

      let count: i64 = count_row.try_get(COUNT_ALIAS)?;
      let items = decode_rows(rows)?;

      debug!(
         collection = self.spec.name,
         count,
         returned = items.len(),
         "fetched collection page"
      );

      Ok(CollectionPage { items, count })
   }
}

impl IntoFuture for FetchCollectionBuilder {
   type Output = Result<CollectionPage, Error>;
   type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send>>;

   fn into_future(self) -> Self::IntoFuture {
      Box::pin(self.execute())
   }
}

/// Helper to decode SQLite rows to JSON
pub(crate) fn decode_rows(rows: Vec<SqliteRow>) -> Result<Vec<Row>, Error> {
   let mut values = Vec::with_capacity(rows.len());
   for row in rows {
      let mut value = IndexMap::default();
      for (i, column) in row.columns().iter().enumerate() {
         let v = row.try_get_raw(i)?;
         let v = crate::decode::to_json(v)?;
         value.insert(column.name().to_string(), v);
      }
      values.push(value);
   }
   Ok(values)
}
