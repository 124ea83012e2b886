use serde_json::{Value as JsonValue, json};

/// Result type alias for collection query operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for collection queries and CRUD helpers.
///
/// The first group are rejections raised by request validation before any
/// SQL reaches the store. They carry an HTTP-style status code and a payload
/// listing the accepted options. Everything else is a storage-side failure.
#[derive(Debug, thiserror::Error)]
pub enum Error {
   /// Query parameter name is not on the collection's allow-list.
   #[error("unsupported query parameter '{parameter}'")]
   UnsupportedParameter {
      parameter: String,
      valid_queries: Vec<String>,
   },

   /// Sort direction is neither `asc` nor `desc`.
   #[error("invalid order '{value}': expected asc or desc")]
   InvalidOrder { value: String },

   /// Page size or page number is not a whole number.
   #[error("invalid pagination value '{value}' for '{parameter}': expected a whole number")]
   InvalidPagination { parameter: String, value: String },

   /// Sort column is not on the collection's allow-list.
   #[error("invalid sort column '{invalid_column}'")]
   InvalidSortColumn {
      invalid_column: String,
      valid_columns: Vec<String>,
   },

   /// Insert was given a different number of columns and values.
   #[error("insert has {columns} columns but {values} values")]
   ColumnValueMismatch { columns: usize, values: usize },

   /// Adding to a counter column would leave the `i64` range.
   #[error("adding {delta} to {current} overflows the counter")]
   CounterOverflow { current: i64, delta: i64 },

   /// A collection scoped to a parent row was queried without the parent key.
   #[error("collection '{collection}' requires a scope value")]
   MissingScope { collection: String },

   /// Error from SQLx operations.
   #[error(transparent)]
   Sqlx(#[from] sqlx::Error),

   /// Error from the review store.
   #[error(transparent)]
   Store(#[from] review_store::Error),

   /// SQLite type that cannot be mapped to JSON.
   #[error("unsupported datatype: {0}")]
   UnsupportedDatatype(String),

   /// Multiple rows returned from a single-row query.
   #[error("fetch_one() query returned {0} rows, expected 0 or 1")]
   MultipleRowsReturned(usize),

   /// Transaction failed and rollback also failed.
   #[error("transaction failed: {transaction_error}; rollback also failed: {rollback_error}")]
   TransactionRollbackFailed {
      transaction_error: String,
      rollback_error: String,
   },
}

impl Error {
   /// Extract a structured error code from the error type.
   ///
   /// This provides machine-readable error codes for error handling.
   pub fn error_code(&self) -> String {
      match self {
         Error::UnsupportedParameter { .. } => "UNSUPPORTED_PARAMETER".to_string(),
         Error::InvalidOrder { .. } => "INVALID_ORDER".to_string(),
         Error::InvalidPagination { .. } => "INVALID_PAGINATION".to_string(),
         Error::InvalidSortColumn { .. } => "INVALID_SORT_COLUMN".to_string(),
         Error::ColumnValueMismatch { .. } => "COLUMN_VALUE_MISMATCH".to_string(),
         Error::CounterOverflow { .. } => "COUNTER_OVERFLOW".to_string(),
         Error::MissingScope { .. } => "MISSING_SCOPE".to_string(),
         Error::Sqlx(e) => {
            if let Some(code) = e.as_database_error().and_then(|db_err| db_err.code()) {
               return format!("SQLITE_{}", code);
            }
            "SQLX_ERROR".to_string()
         }
         Error::Store(_) => "STORE_ERROR".to_string(),
         Error::UnsupportedDatatype(_) => "UNSUPPORTED_DATATYPE".to_string(),
         Error::MultipleRowsReturned(_) => "MULTIPLE_ROWS_RETURNED".to_string(),
         Error::TransactionRollbackFailed { .. } => "TRANSACTION_ROLLBACK_FAILED".to_string(),
      }
   }

   /// Whether this error is a request rejection rather than a storage failure.
   pub fn is_rejection(&self) -> bool {
      matches!(
         self,
         Error::UnsupportedParameter { .. }
            | Error::InvalidOrder { .. }
            | Error::InvalidPagination { .. }
            | Error::InvalidSortColumn { .. }
      )
   }

   /// HTTP-style status code for this error.
   ///
   /// An unknown sort column is reported as 404 (the column does not exist);
   /// the other rejections and counter overflows are 400. Storage failures
   /// are 500.
   pub fn status_code(&self) -> u16 {
      match self {
         Error::UnsupportedParameter { .. }
         | Error::InvalidOrder { .. }
         | Error::InvalidPagination { .. }
         | Error::CounterOverflow { .. } => 400,
         Error::InvalidSortColumn { .. } => 404,
         _ => 500,
      }
   }

   /// Machine-readable payload describing how to correct the request.
   pub fn payload(&self) -> JsonValue {
      match self {
         Error::UnsupportedParameter {
            parameter,
            valid_queries,
         } => json!({ "invalid_query": parameter, "valid_queries": valid_queries }),
         Error::InvalidOrder { value } => {
            json!({ "invalid_order": value, "valid_orders": ["asc", "desc"] })
         }
         Error::InvalidPagination { parameter, value } => {
            json!({ "invalid_query": parameter, "value": value, "expected": "whole number" })
         }
         Error::InvalidSortColumn {
            invalid_column,
            valid_columns,
         } => json!({ "invalid_column": invalid_column, "valid_columns": valid_columns }),
         other => json!({ "message": other.to_string() }),
      }
   }
}
