//! Engine-wide defaults for collection queries

use serde::{Deserialize, Serialize};

use crate::pagination::{PageWindow, SortDirection};

/// Page size used when a request does not supply one.
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Defaults applied to every collection query.
///
/// The default sort *column* is a property of each collection and lives in
/// its [`CollectionSpec`](crate::CollectionSpec).
///
/// # Examples
///
/// ```
/// use collection_query::QueryConfig;
///
/// let config = QueryConfig {
///     default_page_size: 25,
///     ..Default::default()
/// };
/// assert_eq!(config.window(None, Some(3)).offset, 50);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QueryConfig {
   /// Rows per page when `limit` is absent or zero.
   ///
   /// Default: 10
   pub default_page_size: u64,

   /// Sort direction when `order` is absent.
   ///
   /// Default: descending
   pub default_direction: SortDirection,

   /// Report a filtered listing that matched nothing as not found instead of
   /// an empty page. Collections opt in individually.
   ///
   /// Default: true
   pub not_found_on_empty: bool,
}

impl Default for QueryConfig {
   fn default() -> Self {
      Self {
         default_page_size: DEFAULT_PAGE_SIZE,
         default_direction: SortDirection::Desc,
         not_found_on_empty: true,
      }
   }
}

impl QueryConfig {
   /// Pagination window for a page size and 1-based page number.
   pub fn window(&self, page_size: Option<u64>, page_number: Option<u64>) -> PageWindow {
      PageWindow::new(page_size, page_number, self.default_page_size)
   }
}
