//! # game-reviews
//!
//! Resource model layer of a board game review backend: categories, users,
//! reviews, comments and review likes stored in SQLite.
//!
//! Listings go through the [`collection_query`] engine, so every sort column,
//! filter and search parameter is checked against the allow-lists in
//! [`collections`] before any SQL is rendered. Single-row operations use the
//! engine's table-parametric helpers.
//!
//! ```no_run
//! use game_reviews::{Backend, BackendConfig, QueryParams};
//!
//! # async fn example() -> game_reviews::Result<()> {
//! let backend = Backend::connect("reviews.db", BackendConfig::default()).await?;
//!
//! let mut params = QueryParams::new();
//! params.insert("sort_by".into(), "votes".into());
//! let page = backend.fetch_reviews(&params).await?;
//! println!("{} reviews in total", page.count);
//!
//! backend.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod collections;
mod config;
mod error;
pub mod models;
pub mod schema;

use std::path::Path;

use collection_query::DatabaseWrapper;
use tracing::debug;

pub use collection_query::{CollectionPage, QueryParams, Row, Toggle};
pub use config::BackendConfig;
pub use error::{ApiError, Result};

/// Handle to one review database.
///
/// Cloning is cheap and shares the connection pools.
#[derive(Clone)]
pub struct Backend {
   db: DatabaseWrapper,
}

impl Backend {
   /// Open (creating if missing) the database at `path` and make sure every
   /// table exists.
   pub async fn connect(path: impl AsRef<Path>, config: BackendConfig) -> Result<Self> {
      let path = path.as_ref();
      let db = DatabaseWrapper::connect(path, Some(config.database))
         .await?
         .with_query_config(config.query);

      schema::create_tables(&db).await?;
      debug!("Backend ready at {}", path.display());

      Ok(Self { db })
   }

   /// The underlying engine handle, for listings and helpers not wrapped here.
   pub fn database(&self) -> &DatabaseWrapper {
      &self.db
   }

   /// Close the connection pools. Further calls fail with a storage error.
   pub async fn close(self) -> Result<()> {
      self.db.close().await?;
      Ok(())
   }

   /// Close the pools and delete the database files.
   pub async fn remove(self) -> Result<()> {
      self.db.remove().await?;
      Ok(())
   }
}
