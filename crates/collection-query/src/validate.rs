//! Allow-list validation of raw query-string parameters.
//!
//! Runs before any SQL is composed. Checks are ordered so the caller always
//! sees the first violated rule:
//!
//! 1. unknown parameter name
//! 2. `order` that is not `asc`/`desc`
//! 3. `limit`/`p` that is not a whole number
//! 4. `sort_by` that is not an allow-listed column
//!
//! Empty values (`?sort_by=`) count as absent.

use indexmap::IndexMap;

use crate::Error;
use crate::pagination::SortDirection;

/// Query parameter naming the sort column.
pub const SORT_PARAM: &str = "sort_by";
/// Query parameter naming the sort direction.
pub const ORDER_PARAM: &str = "order";
/// Query parameter holding the page size.
pub const LIMIT_PARAM: &str = "limit";
/// Query parameter holding the 1-based page number.
pub const PAGE_PARAM: &str = "p";

/// Raw query-string parameters, in request order.
pub type QueryParams = IndexMap<String, String>;

/// Validate raw parameters against a collection's allow-lists.
///
/// Purely a predicate: returns the first rejection or `Ok(())`.
pub fn validate_collection_query(
   params: &QueryParams,
   allowed_params: &[&str],
   allowed_sort_columns: &[&str],
) -> Result<(), Error> {
   if let Some(unknown) = params
      .keys()
      .find(|name| !allowed_params.contains(&name.as_str()))
   {
      return Err(Error::UnsupportedParameter {
         parameter: unknown.clone(),
         valid_queries: allowed_params.iter().map(|p| p.to_string()).collect(),
      });
   }

   if let Some(order) = present(params, ORDER_PARAM)
      && SortDirection::parse(order).is_none()
   {
      return Err(Error::InvalidOrder {
         value: order.to_string(),
      });
   }

   for parameter in [LIMIT_PARAM, PAGE_PARAM] {
      if let Some(value) = present(params, parameter)
         && parse_whole_number(value).is_none()
      {
         return Err(Error::InvalidPagination {
            parameter: parameter.to_string(),
            value: value.to_string(),
         });
      }
   }

   if let Some(column) = present(params, SORT_PARAM)
      && !allowed_sort_columns.contains(&column)
   {
      return Err(Error::InvalidSortColumn {
         invalid_column: column.to_string(),
         valid_columns: allowed_sort_columns.iter().map(|c| c.to_string()).collect(),
      });
   }

   Ok(())
}

/// Parse a base-10 whole number (`"0"`, `"12"`).
///
/// Signs, whitespace, fractions (`"1.25"`) and exponents are rejected, as are
/// values that do not fit in a `u64`.
pub fn parse_whole_number(value: &str) -> Option<u64> {
   if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
      return None;
   }
   value.parse().ok()
}

/// Non-empty value of `name`, if present.
pub(crate) fn present<'a>(params: &'a QueryParams, name: &str) -> Option<&'a str> {
   params
      .get(name)
      .map(String::as_str)
      .filter(|value| !value.is_empty())
}
