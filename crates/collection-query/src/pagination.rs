//! Offset pagination and sort direction.
//!
//! Collections are paged with a 1-based page number and a page size, turned
//! into a `LIMIT`/`OFFSET` pair:
//!
//! ```text
//! limit  = page_size (default when absent or zero)
//! offset = limit * (page_number - 1), or 0 when page_number is absent or zero
//! ```
//!
//! # Example
//!
//! ```
//! use collection_query::pagination::{PageWindow, compute_window};
//!
//! assert_eq!(compute_window(Some(5), Some(2)), PageWindow { limit: 5, offset: 5 });
//! assert_eq!(compute_window(None, Some(4)), PageWindow { limit: 10, offset: 30 });
//! ```

use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_PAGE_SIZE;

/// Sort direction for a collection query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortDirection {
   /// Ascending order (smallest first)
   Asc,
   /// Descending order (largest first)
   Desc,
}

impl SortDirection {
   /// Parse an `order` query value, case-insensitively.
   pub fn parse(value: &str) -> Option<Self> {
      if value.eq_ignore_ascii_case("asc") {
         Some(SortDirection::Asc)
      } else if value.eq_ignore_ascii_case("desc") {
         Some(SortDirection::Desc)
      } else {
         None
      }
   }

   /// SQL keyword for this direction.
   pub fn as_sql(self) -> &'static str {
      match self {
         SortDirection::Asc => "ASC",
         SortDirection::Desc => "DESC",
      }
   }
}

/// Row window for one page of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageWindow {
   /// Maximum number of rows in the page (always greater than zero)
   pub limit: u64,
   /// Number of matching rows skipped before the page starts
   pub offset: u64,
}

impl PageWindow {
   /// Derive a window from an optional page size and 1-based page number.
   ///
   /// A missing or zero page size falls back to `default_page_size`; a
   /// missing or zero page number means the first page.
   pub fn new(page_size: Option<u64>, page_number: Option<u64>, default_page_size: u64) -> Self {
      let limit = match page_size {
         Some(size) if size > 0 => size,
         _ => default_page_size.max(1),
      };

      let offset = match page_number {
         Some(page) if page > 0 => limit.saturating_mul(page - 1),
         _ => 0,
      };

      Self { limit, offset }
   }

   /// `LIMIT` as a SQLite integer.
   pub fn limit_i64(&self) -> i64 {
      i64::try_from(self.limit).unwrap_or(i64::MAX)
   }

   /// `OFFSET` as a SQLite integer.
   pub fn offset_i64(&self) -> i64 {
      i64::try_from(self.offset).unwrap_or(i64::MAX)
   }
}

/// Window with the engine's default page size.
pub fn compute_window(page_size: Option<u64>, page_number: Option<u64>) -> PageWindow {
   PageWindow::new(page_size, page_number, DEFAULT_PAGE_SIZE)
}
