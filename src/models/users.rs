use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};
use tracing::debug;

use crate::collections::{USER_COMMENTS, USER_LIKES, USERS, columns, tables};
use crate::models::{parse_body, parse_id};
use crate::{ApiError, Backend, CollectionPage, QueryParams, Result, Row};

/// Body of `POST /api/users`. Surplus keys are ignored.
#[derive(Debug, Deserialize)]
pub struct NewUser {
   pub username: String,
   pub avatar_url: Option<String>,
   pub name: Option<String>,
}

/// Body of `PATCH /api/users/:username`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserUpdate {
   pub name: Option<String>,
   pub avatar_url: Option<String>,
}

/// Answer of `GET /api/users/:username/likes/:review_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Liked {
   pub liked: bool,
}

const USER_UPDATE_FORMAT: &str = "{ name?: string, avatar_url?: string }";

impl Backend {
   pub async fn fetch_users(&self, params: &QueryParams) -> Result<CollectionPage> {
      let request = USERS.request(params)?;
      Ok(self.db.fetch_collection(&USERS, request).await?)
   }

   /// One user, with how many reviews, comments and likes they have made.
   pub async fn fetch_user(&self, username: &str) -> Result<Row> {
      let mut user = self
         .db
         .select_one(tables::USERS, columns::USERNAME, username)
         .await?
         .ok_or_else(|| ApiError::not_found("user"))?;

      let review_count = self
         .db
         .count_where(tables::REVIEWS, columns::OWNER, username)
         .await?;
      let comment_count = self
         .db
         .count_where(tables::COMMENTS, columns::AUTHOR, username)
         .await?;
      let like_count = self
         .db
         .count_where(tables::REVIEW_LIKES, columns::USERNAME, username)
         .await?;

      user.insert("review_count".into(), json!(review_count));
      user.insert("comment_count".into(), json!(comment_count));
      user.insert("like_count".into(), json!(like_count));
      Ok(user)
   }

   /// Create a user. Missing `name` and `avatar_url` take the column defaults.
   pub async fn add_user(&self, body: JsonValue) -> Result<Row> {
      let user: NewUser = parse_body(
         body,
         "{ username: string, name?: string, avatar_url?: string }",
      )?;

      let mut names = vec![columns::USERNAME];
      let mut values = vec![json!(user.username)];
      if let Some(name) = user.name {
         names.push(columns::NAME);
         values.push(json!(name));
      }
      if let Some(avatar_url) = user.avatar_url {
         names.push(columns::AVATAR_URL);
         values.push(json!(avatar_url));
      }

      self
         .db
         .insert(tables::USERS, &names, values)
         .await
         .map_err(|err| ApiError::from_write(err, Some(ApiError::UsernameTaken), None))
   }

   /// Change a user's `name` and/or `avatar_url`.
   pub async fn update_user(&self, username: &str, body: JsonValue) -> Result<Row> {
      let update: UserUpdate = parse_body(body, USER_UPDATE_FORMAT)?;

      let changes = [
         (columns::NAME, update.name),
         (columns::AVATAR_URL, update.avatar_url),
      ]
      .into_iter()
      .filter_map(|(column, value)| value.map(|value| (column, json!(value))))
      .collect::<Vec<_>>();

      if changes.is_empty() {
         return Err(ApiError::invalid_body(USER_UPDATE_FORMAT));
      }

      self
         .db
         .update_columns(tables::USERS, changes, columns::USERNAME, username)
         .await?
         .into_iter()
         .next()
         .ok_or_else(|| ApiError::not_found("user"))
   }

   /// Delete a user along with their reviews, comments and likes.
   pub async fn remove_user(&self, username: &str) -> Result<()> {
      let removed = self
         .db
         .delete_row(tables::USERS, columns::USERNAME, username)
         .await?;

      if removed == 0 {
         return Err(ApiError::not_found("user"));
      }
      debug!(username, "removed user");
      Ok(())
   }

   /// The likes a user has given, newest first by default.
   pub async fn fetch_user_likes(&self, username: &str, params: &QueryParams) -> Result<CollectionPage> {
      let request = USER_LIKES.request(params)?;
      self.require_user(username).await?;

      Ok(self
         .db
         .fetch_collection(&USER_LIKES, request)
         .within(username)
         .await?)
   }

   /// The comments a user has written.
   pub async fn fetch_user_comments(
      &self,
      username: &str,
      params: &QueryParams,
   ) -> Result<CollectionPage> {
      let request = USER_COMMENTS.request(params)?;
      self.require_user(username).await?;

      Ok(self
         .db
         .fetch_collection(&USER_COMMENTS, request)
         .within(username)
         .await?)
   }

   /// Whether `username` currently likes the review.
   pub async fn user_liked_review(&self, username: &str, review_id: &str) -> Result<Liked> {
      let review_id = parse_id(review_id)?;
      self.require_user(username).await?;
      self.require_review(review_id).await?;

      let query = format!(
         "SELECT 1 AS \"found\" FROM {} WHERE {} = $1 AND {} = $2",
         tables::REVIEW_LIKES,
         columns::USERNAME,
         columns::REVIEW_ID,
      );
      let found = self
         .db
         .fetch_one(query, vec![json!(username), json!(review_id)])
         .await?;

      Ok(Liked {
         liked: found.is_some(),
      })
   }

   pub(crate) async fn require_user(&self, username: &str) -> Result<()> {
      if self
         .db
         .exists(tables::USERS, columns::USERNAME, username)
         .await?
      {
         Ok(())
      } else {
         Err(ApiError::not_found("user"))
      }
   }
}
