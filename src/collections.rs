//! Allow-list tables for every listable collection.
//!
//! These are the only identifiers that reach listing SQL. A request
//! parameter or sort column missing from these tables is rejected before
//! any statement is built.

use collection_query::{
   ChildCount, CollectionSpec, FilterParam, Ident, SearchParam, SortColumn, ValueNormalization,
};

pub mod tables {
   use collection_query::Ident;

   pub const CATEGORIES: Ident = Ident::new("categories");
   pub const USERS: Ident = Ident::new("users");
   pub const REVIEWS: Ident = Ident::new("reviews");
   pub const COMMENTS: Ident = Ident::new("comments");
   pub const REVIEW_LIKES: Ident = Ident::new("review_likes");
   /// View joining `review_likes` with the liking user's profile
   pub const REVIEW_LIKERS: Ident = Ident::new("review_likers");
}

pub mod columns {
   use collection_query::Ident;

   pub const SLUG: Ident = Ident::new("slug");
   pub const DESCRIPTION: Ident = Ident::new("description");
   pub const USERNAME: Ident = Ident::new("username");
   pub const NAME: Ident = Ident::new("name");
   pub const AVATAR_URL: Ident = Ident::new("avatar_url");
   pub const REVIEW_ID: Ident = Ident::new("review_id");
   pub const TITLE: Ident = Ident::new("title");
   pub const REVIEW_BODY: Ident = Ident::new("review_body");
   pub const DESIGNER: Ident = Ident::new("designer");
   pub const REVIEW_IMG_URL: Ident = Ident::new("review_img_url");
   pub const CATEGORY: Ident = Ident::new("category");
   pub const OWNER: Ident = Ident::new("owner");
   pub const COMMENT_ID: Ident = Ident::new("comment_id");
   pub const AUTHOR: Ident = Ident::new("author");
   pub const BODY: Ident = Ident::new("body");
   pub const RL_P_KEY: Ident = Ident::new("rl_p_key");
}

/// Filter column of the reviews listing's `category` parameter.
pub const REVIEW_CATEGORY: Ident = Ident::new("reviews.category");

/// `GET /api/reviews`
pub static REVIEWS: CollectionSpec = CollectionSpec {
   name: "reviews",
   table: tables::REVIEWS,
   primary_key: Ident::new("reviews.review_id"),
   columns: &[
      Ident::new("reviews.owner"),
      Ident::new("reviews.title"),
      Ident::new("reviews.review_id"),
      Ident::new("reviews.category"),
      Ident::new("reviews.review_img_url"),
      Ident::new("reviews.created_at"),
      Ident::new("reviews.votes"),
      Ident::new("reviews.designer"),
   ],
   params: &[
      "sort_by", "order", "category", "username", "search", "limit", "p",
   ],
   sort_columns: &[
      SortColumn::new("owner", Ident::new("reviews.owner")),
      SortColumn::new("title", Ident::new("reviews.title")),
      SortColumn::new("review_id", Ident::new("reviews.review_id")),
      SortColumn::new("category", Ident::new("reviews.category")),
      SortColumn::new("designer", Ident::new("reviews.designer")),
      SortColumn::new("votes", Ident::new("reviews.votes")),
      SortColumn::new("comment_count", Ident::new("comment_count")),
      SortColumn::new("created_at", Ident::new("reviews.created_at")),
   ],
   default_sort: Ident::new("reviews.created_at"),
   filters: &[
      FilterParam {
         param: "category",
         column: REVIEW_CATEGORY,
         normalization: ValueNormalization::UnderscoresToSpaces,
      },
      FilterParam {
         param: "username",
         column: Ident::new("reviews.owner"),
         normalization: ValueNormalization::None,
      },
   ],
   search: Some(SearchParam {
      param: "search",
      column: Ident::new("reviews.title"),
   }),
   scope: None,
   child_count: Some(ChildCount {
      table: tables::COMMENTS,
      foreign_key: Ident::new("comments.review_id"),
      counted: Ident::new("comments.comment_id"),
      alias: Ident::new("comment_count"),
   }),
};

/// `GET /api/users`
pub static USERS: CollectionSpec = CollectionSpec {
   name: "users",
   table: tables::USERS,
   primary_key: Ident::new("users.username"),
   columns: &[
      Ident::new("users.username"),
      Ident::new("users.avatar_url"),
      Ident::new("users.name"),
      Ident::new("users.created"),
   ],
   params: &["sort_by", "search", "order", "limit", "p"],
   sort_columns: &[
      SortColumn::new("username", Ident::new("users.username")),
      SortColumn::new("name", Ident::new("users.name")),
      SortColumn::new("created", Ident::new("users.created")),
   ],
   default_sort: Ident::new("users.created"),
   filters: &[],
   search: Some(SearchParam {
      param: "search",
      column: Ident::new("users.username"),
   }),
   scope: None,
   child_count: None,
};

const COMMENT_COLUMNS: &[Ident] = &[
   Ident::new("comments.comment_id"),
   Ident::new("comments.author"),
   Ident::new("comments.review_id"),
   Ident::new("comments.votes"),
   Ident::new("comments.created_at"),
   Ident::new("comments.body"),
];

/// `GET /api/reviews/:review_id/comments`
pub static REVIEW_COMMENTS: CollectionSpec = CollectionSpec {
   name: "review comments",
   table: tables::COMMENTS,
   primary_key: Ident::new("comments.comment_id"),
   columns: COMMENT_COLUMNS,
   params: &["sort_by", "order", "limit", "p"],
   sort_columns: &[
      SortColumn::new("comment_id", Ident::new("comments.comment_id")),
      SortColumn::new("votes", Ident::new("comments.votes")),
      SortColumn::new("created_at", Ident::new("comments.created_at")),
      SortColumn::new("author", Ident::new("comments.author")),
   ],
   default_sort: Ident::new("comments.created_at"),
   filters: &[],
   search: None,
   scope: Some(Ident::new("comments.review_id")),
   child_count: None,
};

/// `GET /api/users/:username/comments`
pub static USER_COMMENTS: CollectionSpec = CollectionSpec {
   name: "user comments",
   table: tables::COMMENTS,
   primary_key: Ident::new("comments.comment_id"),
   columns: COMMENT_COLUMNS,
   params: &["sort_by", "order", "limit", "p"],
   sort_columns: &[
      SortColumn::new("comment_id", Ident::new("comments.comment_id")),
      SortColumn::new("votes", Ident::new("comments.votes")),
      SortColumn::new("created_at", Ident::new("comments.created_at")),
      SortColumn::new("review_id", Ident::new("comments.review_id")),
   ],
   default_sort: Ident::new("comments.created_at"),
   filters: &[],
   search: None,
   scope: Some(Ident::new("comments.author")),
   child_count: None,
};

/// `GET /api/users/:username/likes`
pub static USER_LIKES: CollectionSpec = CollectionSpec {
   name: "user likes",
   table: tables::REVIEW_LIKES,
   primary_key: Ident::new("review_likes.rl_p_key"),
   columns: &[
      Ident::new("review_likes.rl_p_key"),
      Ident::new("review_likes.username"),
      Ident::new("review_likes.review_id"),
      Ident::new("review_likes.liked_at"),
   ],
   params: &["order", "limit", "p"],
   sort_columns: &[],
   default_sort: Ident::new("review_likes.liked_at"),
   filters: &[],
   search: None,
   scope: Some(Ident::new("review_likes.username")),
   child_count: None,
};

/// Parameters accepted by `GET /api/reviews/:review_id/likes`.
pub const REVIEW_LIKES_PARAMS: &[&str] = &["limit", "p"];

#[cfg(test)]
mod tests {
   use collection_query::{QueryConfig, QueryParams, QueryPlan};

   use super::*;

   fn params(pairs: &[(&str, &str)]) -> QueryParams {
      pairs
         .iter()
         .map(|(k, v)| (k.to_string(), v.to_string()))
         .collect()
   }

   #[test]
   fn every_sort_column_is_unique() {
      for spec in [&REVIEWS, &USERS, &REVIEW_COMMENTS, &USER_COMMENTS, &USER_LIKES] {
         let mut names = spec.sort_column_names();
         names.sort_unstable();
         names.dedup();
         assert_eq!(names.len(), spec.sort_columns.len(), "{}", spec.name);
      }
   }

   #[test]
   fn reviews_rejects_sort_by_review_body() {
      let err = REVIEWS
         .request(&params(&[("sort_by", "review_body")]))
         .unwrap_err();
      assert_eq!(err.status_code(), 404);
   }

   #[test]
   fn reviews_plan_counts_comments_with_left_join() {
      let request = REVIEWS
         .request(&params(&[("category", "social_deduction")]))
         .unwrap();
      let plan = QueryPlan::build(&REVIEWS, &request, &QueryConfig::default()).unwrap();

      assert!(plan.sql().contains(
         "LEFT JOIN \"comments\" ON \"comments\".\"review_id\" = \"reviews\".\"review_id\""
      ));
      assert!(
         plan
            .sql()
            .contains("COUNT(\"comments\".\"comment_id\") AS \"comment_count\"")
      );
      assert_eq!(
         plan.count_sql(),
         "SELECT COUNT(*) AS \"count\" FROM \"reviews\" WHERE \"reviews\".\"category\" = $1"
      );
      assert_eq!(plan.count_params(), &[serde_json::json!("social deduction")]);
   }

   #[test]
   fn user_likes_has_no_sort_param() {
      let err = USER_LIKES
         .request(&params(&[("sort_by", "liked_at")]))
         .unwrap_err();
      assert_eq!(err.error_code(), "UNSUPPORTED_PARAMETER");
   }
}
