//! # collection-query
//!
//! Allow-listed collection listings and table-parametric row helpers over
//! SQLite, built on [`review_store`].
//!
//! A listing goes through four steps:
//!
//! 1. [`validate_collection_query`] checks raw query parameters against a
//!    collection's allow-lists.
//! 2. [`CollectionSpec::request`] resolves them into a [`CollectionRequest`]
//!    holding only allow-listed identifiers.
//! 3. [`QueryPlan::build`] renders the page and count statements, binding
//!    every request value.
//! 4. [`DatabaseWrapper::fetch_collection`] runs both statements and returns
//!    a [`CollectionPage`].
//!
//! ```no_run
//! use collection_query::{
//!    CollectionSpec, DatabaseWrapper, Ident, QueryParams, SortColumn,
//! };
//!
//! static GAMES: CollectionSpec = CollectionSpec {
//!    name: "games",
//!    table: Ident::new("games"),
//!    primary_key: Ident::new("games.game_id"),
//!    columns: &[Ident::new("games.game_id"), Ident::new("games.title")],
//!    params: &["sort_by", "order", "limit", "p"],
//!    sort_columns: &[SortColumn::new("title", Ident::new("games.title"))],
//!    default_sort: Ident::new("games.game_id"),
//!    filters: &[],
//!    search: None,
//!    scope: None,
//!    child_count: None,
//! };
//!
//! # async fn example(db: DatabaseWrapper, params: QueryParams) -> collection_query::Result<()> {
//! let request = GAMES.request(&params)?;
//! let page = db.fetch_collection(&GAMES, request).await?;
//! println!("{} of {} games", page.items.len(), page.count);
//! # Ok(())
//! # }
//! ```

mod builders;
pub mod collection;
mod config;
mod crud;
mod decode;
mod error;
mod ident;
pub mod pagination;
pub mod plan;
pub mod validate;
mod wrapper;

use indexmap::IndexMap;
use serde_json::Value as JsonValue;

pub use builders::{CollectionPage, FetchCollectionBuilder};
pub use collection::{
   ChildCount, CollectionRequest, CollectionSpec, FilterParam, SearchParam, SortColumn,
   ValueNormalization, page_window,
};
pub use config::{DEFAULT_PAGE_SIZE, QueryConfig};
pub use crud::{Toggle, VOTES_COLUMN};
pub use error::{Error, Result};
pub use ident::Ident;
pub use pagination::{PageWindow, SortDirection, compute_window};
pub use plan::{QueryPlan, build_list_query, like_pattern};
pub use validate::{QueryParams, parse_whole_number, validate_collection_query};
pub use wrapper::{DatabaseWrapper, WriteQueryResult};

pub use review_store::{SqliteDatabase, SqliteDatabaseConfig};

/// A decoded row: column name to JSON value, in column order.
pub type Row = IndexMap<String, JsonValue>;
