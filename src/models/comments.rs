use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::collections::{columns, tables};
use crate::models::reviews::{VOTE_FORMAT, VoteChange, vote_error};
use crate::models::{parse_body, parse_id};
use crate::{ApiError, Backend, Result, Row};

/// Body of `PATCH /api/comments/:comment_id/body`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommentEdit {
   pub body: String,
}

impl Backend {
   pub async fn remove_comment(&self, comment_id: &str) -> Result<()> {
      let comment_id = parse_id(comment_id)?;
      let removed = self
         .db
         .delete_row(tables::COMMENTS, columns::COMMENT_ID, comment_id)
         .await?;

      if removed == 0 {
         return Err(ApiError::not_found("comment"));
      }
      debug!(comment_id, "removed comment");
      Ok(())
   }

   /// Add `inc_votes` (possibly negative) to a comment's votes.
   pub async fn amend_comment_votes(&self, comment_id: &str, body: JsonValue) -> Result<Row> {
      let comment_id = parse_id(comment_id)?;
      let change: VoteChange = parse_body(body, VOTE_FORMAT)?;

      self
         .db
         .update_vote_counter(tables::COMMENTS, change.inc_votes, columns::COMMENT_ID, comment_id)
         .await
         .map_err(vote_error)?
         .ok_or_else(|| ApiError::not_found("comment"))
   }

   pub async fn edit_comment(&self, comment_id: &str, body: JsonValue) -> Result<Row> {
      let comment_id = parse_id(comment_id)?;
      let edit: CommentEdit = parse_body(body, "{ body: string }")?;

      self
         .db
         .update_column(
            tables::COMMENTS,
            columns::BODY,
            edit.body,
            columns::COMMENT_ID,
            comment_id,
         )
         .await?
         .into_iter()
         .next()
         .ok_or_else(|| ApiError::not_found("comment"))
   }
}
