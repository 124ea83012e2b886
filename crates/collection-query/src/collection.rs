//! Allow-list tables describing a listable collection, and the validated
//! request derived from raw query parameters.

use serde_json::Value as JsonValue;

use crate::config::QueryConfig;
use crate::ident::Ident;
use crate::pagination::{PageWindow, SortDirection};
use crate::validate::{
   LIMIT_PARAM, ORDER_PARAM, PAGE_PARAM, QueryParams, SORT_PARAM, parse_whole_number, present,
   validate_collection_query,
};
use crate::{Error, Result};

/// A sortable column: the public `sort_by` value and the SQL it sorts on.
#[derive(Debug, Clone, Copy)]
pub struct SortColumn {
   pub param: &'static str,
   pub expr: Ident,
}

impl SortColumn {
   pub const fn new(param: &'static str, expr: Ident) -> Self {
      Self { param, expr }
   }
}

/// How a filter value is rewritten before it is bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueNormalization {
   /// Bind the value as received
   None,
   /// Replace every `_` with a space (`social_deduction` → `social deduction`)
   UnderscoresToSpaces,
}

impl ValueNormalization {
   pub fn apply(self, value: &str) -> String {
      match self {
         ValueNormalization::None => value.to_string(),
         ValueNormalization::UnderscoresToSpaces => value.replace('_', " "),
      }
   }
}

/// Equality filter: `?param=value` becomes `column = $n`.
#[derive(Debug, Clone, Copy)]
pub struct FilterParam {
   pub param: &'static str,
   pub column: Ident,
   pub normalization: ValueNormalization,
}

/// Substring search: `?param=text` becomes `column LIKE '%text%'`.
#[derive(Debug, Clone, Copy)]
pub struct SearchParam {
   pub param: &'static str,
   pub column: Ident,
}

/// Per-row count of child rows, joined with `LEFT JOIN` so rows without
/// children are kept with a count of zero.
#[derive(Debug, Clone, Copy)]
pub struct ChildCount {
   /// Child table, e.g. `comments`
   pub table: Ident,
   /// Child column referencing the parent key, e.g. `comments.review_id`
   pub foreign_key: Ident,
   /// Child column counted, e.g. `comments.comment_id`
   pub counted: Ident,
   /// Output column name, e.g. `comment_count`
   pub alias: Ident,
}

/// Static allow-list table for one collection.
///
/// Every identifier that can reach SQL for this collection is listed here.
/// Filter, search and projection columns must belong to `table`.
#[derive(Debug, Clone, Copy)]
pub struct CollectionSpec {
   /// Name used in logs and errors
   pub name: &'static str,
   pub table: Ident,
   pub primary_key: Ident,
   /// Selected columns, qualified with `table`
   pub columns: &'static [Ident],
   /// Every accepted query parameter name
   pub params: &'static [&'static str],
   pub sort_columns: &'static [SortColumn],
   pub default_sort: Ident,
   pub filters: &'static [FilterParam],
   pub search: Option<SearchParam>,
   /// Column bound from the parent row (e.g. the review id in the path)
   pub scope: Option<Ident>,
   pub child_count: Option<ChildCount>,
}

impl CollectionSpec {
   /// Public names accepted by `sort_by`.
   pub fn sort_column_names(&self) -> Vec<&'static str> {
      self.sort_columns.iter().map(|c| c.param).collect()
   }

   /// SQL expression for an allow-listed `sort_by` value.
   pub fn sort_expr(&self, param: &str) -> Option<Ident> {
      self
         .sort_columns
         .iter()
         .find(|c| c.param == param)
         .map(|c| c.expr)
   }

   /// Validate `params` and resolve them into a request.
   pub fn request(&self, params: &QueryParams) -> Result<CollectionRequest> {
      CollectionRequest::from_params(self, params)
   }
}

/// A validated collection request.
///
/// Identifiers in here were taken from the [`CollectionSpec`], not from the
/// request; only values (filter text, search text, numbers) came from input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionRequest {
   pub sort: Option<Ident>,
   pub direction: Option<SortDirection>,
   /// Filter columns with their normalized values
   pub filters: Vec<(Ident, String)>,
   pub search: Option<String>,
   pub page_size: Option<u64>,
   pub page_number: Option<u64>,
   pub scope: Option<JsonValue>,
}

impl CollectionRequest {
   /// Validate raw parameters and resolve them against `spec`.
   pub fn from_params(spec: &CollectionSpec, params: &QueryParams) -> Result<Self> {
      validate_collection_query(params, spec.params, &spec.sort_column_names())?;

      let sort = match present(params, SORT_PARAM) {
         Some(column) => Some(spec.sort_expr(column).ok_or_else(|| {
            Error::InvalidSortColumn {
               invalid_column: column.to_string(),
               valid_columns: spec.sort_column_names().iter().map(|c| c.to_string()).collect(),
            }
         })?),
         None => None,
      };

      let direction = match present(params, ORDER_PARAM) {
         Some(order) => Some(SortDirection::parse(order).ok_or_else(|| Error::InvalidOrder {
            value: order.to_string(),
         })?),
         None => None,
      };

      let filters = spec
         .filters
         .iter()
         .filter_map(|filter| {
            present(params, filter.param)
               .map(|value| (filter.column, filter.normalization.apply(value)))
         })
         .collect();

      let search = spec
         .search
         .and_then(|search| present(params, search.param))
         .map(str::to_string);

      Ok(Self {
         sort,
         direction,
         filters,
         search,
         page_size: whole_number(params, LIMIT_PARAM)?,
         page_number: whole_number(params, PAGE_PARAM)?,
         scope: None,
      })
   }

   /// Restrict the request to children of one parent row.
   pub fn within(mut self, value: impl Into<JsonValue>) -> Self {
      self.scope = Some(value.into());
      self
   }

   /// Pagination window under `config`'s defaults.
   pub fn window(&self, config: &QueryConfig) -> PageWindow {
      config.window(self.page_size, self.page_number)
   }

   /// Normalized value of the filter on `column`, if one was given.
   pub fn filter_value(&self, column: Ident) -> Option<&str> {
      self
         .filters
         .iter()
         .find(|(c, _)| *c == column)
         .map(|(_, value)| value.as_str())
   }
}

/// Pagination window from the `limit`/`p` parameters alone.
///
/// For listings that page without sorting or filtering; run
/// [`validate_collection_query`] on the parameters first.
pub fn page_window(params: &QueryParams, config: &QueryConfig) -> Result<PageWindow> {
   Ok(config.window(
      whole_number(params, LIMIT_PARAM)?,
      whole_number(params, PAGE_PARAM)?,
   ))
}

fn whole_number(params: &QueryParams, name: &str) -> Result<Option<u64>> {
   match present(params, name) {
      Some(value) => parse_whole_number(value)
         .map(Some)
         .ok_or_else(|| Error::InvalidPagination {
            parameter: name.to_string(),
            value: value.to_string(),
         }),
      None => Ok(None),
   }
}
