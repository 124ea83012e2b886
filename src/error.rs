use serde_json::{Value as JsonValue, json};

/// Result type alias for backend operations.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors surfaced by the resource operations.
///
/// Each maps to an HTTP-style status code and a JSON payload with a
/// human-readable `message`, mirroring what the API responds with.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
   /// A path id that is not a positive integer.
   #[error("Bad request")]
   BadRequest,

   /// A request body with missing keys, wrong types or unexpected keys.
   #[error("Invalid body")]
   InvalidBody { expected: &'static str },

   /// The addressed resource does not exist.
   #[error("Non-existent {resource}")]
   NotFound { resource: &'static str },

   /// A listing was filtered by a category that does not exist.
   #[error("Non-existent category")]
   NonExistentCategory { valid_categories: Vec<String> },

   /// A listing matched no rows and the backend reports that as not found.
   #[error("No {collection} found")]
   EmptyCollection { collection: &'static str },

   /// A new user collided with an existing username.
   #[error("Username already exists")]
   UsernameTaken,

   /// A new category collided with an existing slug.
   #[error("Category already exists")]
   CategoryTaken,

   /// A review referenced a category that does not exist.
   #[error("Invalid category")]
   InvalidCategory,

   /// Query rejection or storage failure from the collection engine.
   #[error(transparent)]
   Query(#[from] collection_query::Error),
}

impl ApiError {
   pub(crate) fn not_found(resource: &'static str) -> Self {
      ApiError::NotFound { resource }
   }

   pub(crate) fn invalid_body(expected: &'static str) -> Self {
      ApiError::InvalidBody { expected }
   }

   /// Machine-readable error code.
   pub fn error_code(&self) -> String {
      match self {
         ApiError::BadRequest => "BAD_REQUEST".to_string(),
         ApiError::InvalidBody { .. } => "INVALID_BODY".to_string(),
         ApiError::NotFound { .. } => "NOT_FOUND".to_string(),
         ApiError::NonExistentCategory { .. } => "NON_EXISTENT_CATEGORY".to_string(),
         ApiError::EmptyCollection { .. } => "EMPTY_COLLECTION".to_string(),
         ApiError::UsernameTaken => "USERNAME_TAKEN".to_string(),
         ApiError::CategoryTaken => "CATEGORY_TAKEN".to_string(),
         ApiError::InvalidCategory => "INVALID_CATEGORY".to_string(),
         ApiError::Query(e) => e.error_code(),
      }
   }

   /// HTTP-style status code.
   pub fn status_code(&self) -> u16 {
      match self {
         ApiError::BadRequest
         | ApiError::InvalidBody { .. }
         | ApiError::UsernameTaken
         | ApiError::CategoryTaken
         | ApiError::InvalidCategory => 400,
         ApiError::NotFound { .. }
         | ApiError::NonExistentCategory { .. }
         | ApiError::EmptyCollection { .. } => 404,
         ApiError::Query(e) => e.status_code(),
      }
   }

   /// Whether this is a storage failure rather than a problem with the request.
   pub fn is_internal(&self) -> bool {
      self.status_code() >= 500
   }

   /// Response payload: `status`, `message` and any correction hints.
   pub fn payload(&self) -> JsonValue {
      let status = self.status_code();
      let mut payload = match self {
         ApiError::InvalidBody { expected } => {
            json!({ "message": self.to_string(), "valid_format": expected })
         }
         ApiError::NonExistentCategory { valid_categories } => {
            json!({ "message": self.to_string(), "valid_categories": valid_categories })
         }
         ApiError::Query(e) if e.is_rejection() => {
            let mut payload = e.payload();
            payload["message"] = json!("Invalid query");
            payload
         }
         ApiError::Query(_) => json!({ "message": "Internal server error" }),
         _ => json!({ "message": self.to_string() }),
      };
      payload["status"] = json!(status);
      payload
   }

   /// Classify a failed write, turning constraint violations into the
   /// matching request error.
   pub(crate) fn from_write(
      err: collection_query::Error,
      on_unique: Option<ApiError>,
      on_foreign_key: Option<ApiError>,
   ) -> Self {
      let violation = match &err {
         collection_query::Error::Sqlx(sqlx_err) => {
            sqlx_err.as_database_error().map(|db_err| {
               (
                  db_err.is_unique_violation(),
                  db_err.is_foreign_key_violation(),
               )
            })
         }
         _ => None,
      };

      match (violation, on_unique, on_foreign_key) {
         (Some((true, _)), Some(mapped), _) => mapped,
         (Some((_, true)), _, Some(mapped)) => mapped,
         _ => ApiError::Query(err),
      }
   }
}

impl From<review_store::Error> for ApiError {
   fn from(err: review_store::Error) -> Self {
      ApiError::Query(err.into())
   }
}
