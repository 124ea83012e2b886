use collection_query::{CollectionPage, Toggle, page_window, validate_collection_query};
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};
use tracing::debug;

use crate::collections::{REVIEW_CATEGORY, REVIEW_COMMENTS, REVIEW_LIKES_PARAMS, REVIEWS, columns, tables};
use crate::models::{parse_body, parse_id};
use crate::{ApiError, Backend, QueryParams, Result, Row};

/// Body of `POST /api/reviews`.
#[derive(Debug, Deserialize)]
pub struct NewReview {
   pub owner: String,
   pub title: String,
   pub review_body: String,
   pub designer: String,
   pub category: String,
   pub review_img_url: Option<String>,
}

/// Body of the vote endpoints: `{ inc_votes }` and nothing else.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VoteChange {
   pub inc_votes: i64,
}

/// Body of `PATCH /api/reviews/:review_id/body`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReviewEdit {
   pub review_body: String,
}

/// Body of `POST /api/reviews/:review_id/comments`.
#[derive(Debug, Deserialize)]
pub struct NewComment {
   pub username: String,
   pub body: String,
}

/// Body of `POST /api/reviews/:review_id/likes`.
#[derive(Debug, Deserialize)]
pub struct LikeToggle {
   pub username: String,
}

pub(crate) const VOTE_FORMAT: &str = "{ inc_votes: number }";

/// A vote change that would overflow the counter is an invalid body.
pub(crate) fn vote_error(err: collection_query::Error) -> ApiError {
   match err {
      collection_query::Error::CounterOverflow { .. } => ApiError::invalid_body(VOTE_FORMAT),
      other => ApiError::Query(other),
   }
}

const REVIEW_WITH_COUNTS: &str = "SELECT reviews.*, \
   (SELECT COUNT(*) FROM comments WHERE comments.review_id = reviews.review_id) AS comment_count, \
   (SELECT COUNT(*) FROM review_likes WHERE review_likes.review_id = reviews.review_id) AS likes \
   FROM reviews WHERE reviews.review_id = $1";

impl Backend {
   /// List reviews.
   ///
   /// A category that does not exist is always a 404 listing the valid
   /// categories. A category with no reviews is an empty page. Any other
   /// filter matching nothing is a 404 when the query config asks for it.
   pub async fn fetch_reviews(&self, params: &QueryParams) -> Result<CollectionPage> {
      let request = REVIEWS.request(params)?;
      let category = request.filter_value(REVIEW_CATEGORY).map(str::to_string);

      let page = self.db.fetch_collection(&REVIEWS, request).await?;
      if !page.is_empty() {
         return Ok(page);
      }

      match category {
         Some(category) => {
            if self
               .db
               .exists(tables::CATEGORIES, columns::SLUG, category.as_str())
               .await?
            {
               Ok(page)
            } else {
               debug!(category = category.as_str(), "listing filtered by unknown category");
               Err(ApiError::NonExistentCategory {
                  valid_categories: self.category_slugs().await?,
               })
            }
         }
         None if self.db.query_config().not_found_on_empty => Err(ApiError::EmptyCollection {
            collection: REVIEWS.name,
         }),
         None => Ok(page),
      }
   }

   /// One review with its `comment_count` and `likes`.
   pub async fn fetch_review(&self, review_id: &str) -> Result<Row> {
      let review_id = parse_id(review_id)?;
      self.review_with_counts(review_id).await
   }

   /// Create a review for an existing user and category.
   pub async fn add_review(&self, body: JsonValue) -> Result<Row> {
      let review: NewReview = parse_body(
         body,
         "{ owner: string, title: string, review_body: string, designer: string, \
          category: string, review_img_url?: string }",
      )?;
      self.require_user(&review.owner).await?;

      let mut names = vec![
         columns::OWNER,
         columns::TITLE,
         columns::REVIEW_BODY,
         columns::DESIGNER,
         columns::CATEGORY,
      ];
      let mut values = vec![
         json!(review.owner),
         json!(review.title),
         json!(review.review_body),
         json!(review.designer),
         json!(review.category),
      ];
      if let Some(url) = review.review_img_url {
         names.push(columns::REVIEW_IMG_URL);
         values.push(json!(url));
      }

      let mut row = self
         .db
         .insert(tables::REVIEWS, &names, values)
         .await
         .map_err(|err| ApiError::from_write(err, None, Some(ApiError::InvalidCategory)))?;
      row.insert("comment_count".into(), json!(0));
      Ok(row)
   }

   /// Add `inc_votes` (possibly negative) to a review's votes.
   pub async fn amend_review_votes(&self, review_id: &str, body: JsonValue) -> Result<Row> {
      let review_id = parse_id(review_id)?;
      let change: VoteChange = parse_body(body, VOTE_FORMAT)?;

      self
         .db
         .update_vote_counter(tables::REVIEWS, change.inc_votes, columns::REVIEW_ID, review_id)
         .await
         .map_err(vote_error)?
         .ok_or_else(|| ApiError::not_found("review"))
   }

   pub async fn edit_review(&self, review_id: &str, body: JsonValue) -> Result<Row> {
      let review_id = parse_id(review_id)?;
      let edit: ReviewEdit = parse_body(body, "{ review_body: string }")?;

      self
         .db
         .update_column(
            tables::REVIEWS,
            columns::REVIEW_BODY,
            edit.review_body,
            columns::REVIEW_ID,
            review_id,
         )
         .await?
         .into_iter()
         .next()
         .ok_or_else(|| ApiError::not_found("review"))
   }

   /// Delete a review along with its comments and likes.
   pub async fn remove_review(&self, review_id: &str) -> Result<()> {
      let review_id = parse_id(review_id)?;
      let removed = self
         .db
         .delete_row(tables::REVIEWS, columns::REVIEW_ID, review_id)
         .await?;

      if removed == 0 {
         return Err(ApiError::not_found("review"));
      }
      debug!(review_id, "removed review");
      Ok(())
   }

   pub async fn fetch_review_comments(
      &self,
      review_id: &str,
      params: &QueryParams,
   ) -> Result<CollectionPage> {
      let review_id = parse_id(review_id)?;
      let request = REVIEW_COMMENTS.request(params)?;
      self.require_review(review_id).await?;

      Ok(self
         .db
         .fetch_collection(&REVIEW_COMMENTS, request)
         .within(review_id)
         .await?)
   }

   pub async fn add_comment(&self, review_id: &str, body: JsonValue) -> Result<Row> {
      let review_id = parse_id(review_id)?;
      let comment: NewComment = parse_body(body, "{ username: string, body: string }")?;
      self.require_review(review_id).await?;
      self.require_user(&comment.username).await?;

      Ok(self
         .db
         .insert(
            tables::COMMENTS,
            &[columns::AUTHOR, columns::REVIEW_ID, columns::BODY],
            vec![json!(comment.username), json!(review_id), json!(comment.body)],
         )
         .await?)
   }

   /// Users who like a review, in the order they liked it.
   pub async fn fetch_review_likes(
      &self,
      review_id: &str,
      params: &QueryParams,
   ) -> Result<CollectionPage> {
      let review_id = parse_id(review_id)?;
      validate_collection_query(params, REVIEW_LIKES_PARAMS, &[])?;
      let window = page_window(params, self.db.query_config())?;
      self.require_review(review_id).await?;

      let items = self
         .db
         .select_page(
            tables::REVIEW_LIKERS,
            columns::REVIEW_ID,
            review_id,
            columns::RL_P_KEY,
            window,
         )
         .await?;
      let count = self
         .db
         .count_where(tables::REVIEW_LIKES, columns::REVIEW_ID, review_id)
         .await?;

      Ok(CollectionPage { items, count })
   }

   /// Like the review for `username`, or unlike it if already liked.
   pub async fn toggle_review_like(&self, review_id: &str, body: JsonValue) -> Result<Toggle> {
      let review_id = parse_id(review_id)?;
      let like: LikeToggle = parse_body(body, "{ username: string }")?;
      self.require_review(review_id).await?;
      self.require_user(&like.username).await?;

      Ok(self
         .db
         .toggle_pair(
            tables::REVIEW_LIKES,
            (columns::USERNAME, json!(like.username)),
            (columns::REVIEW_ID, json!(review_id)),
         )
         .await?)
   }

   async fn review_with_counts(&self, review_id: i64) -> Result<Row> {
      self
         .db
         .fetch_one(REVIEW_WITH_COUNTS.to_string(), vec![json!(review_id)])
         .await?
         .ok_or_else(|| ApiError::not_found("review"))
   }

   pub(crate) async fn require_review(&self, review_id: i64) -> Result<()> {
      if self
         .db
         .exists(tables::REVIEWS, columns::REVIEW_ID, review_id)
         .await?
      {
         Ok(())
      } else {
         Err(ApiError::not_found("review"))
      }
   }
}
