//! Resource operations, one module per resource.
//!
//! Each module adds methods to [`Backend`](crate::Backend). Path segments
//! arrive as strings and request bodies as JSON values, the way an HTTP
//! handler would pass them on.

mod categories;
mod comments;
mod reviews;
mod users;

use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use crate::{ApiError, Result};

pub use categories::NewCategory;
pub use comments::CommentEdit;
pub use reviews::{LikeToggle, NewComment, NewReview, ReviewEdit, VoteChange};
pub use users::{Liked, NewUser, UserUpdate};

/// Parse a numeric path id. Only positive integers are ids.
pub fn parse_id(raw: &str) -> Result<i64> {
   match raw.parse::<i64>() {
      Ok(id) if id > 0 && raw.bytes().all(|b| b.is_ascii_digit()) => Ok(id),
      _ => Err(ApiError::BadRequest),
   }
}

/// Deserialize a request body, reporting `expected` on a shape mismatch.
pub(crate) fn parse_body<T: DeserializeOwned>(body: JsonValue, expected: &'static str) -> Result<T> {
   serde_json::from_value(body).map_err(|_| ApiError::invalid_body(expected))
}
