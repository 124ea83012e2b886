//! Table definitions.
//!
//! Column names here must stay in step with the allow-lists in
//! [`collections`](crate::collections).

use collection_query::DatabaseWrapper;
use tracing::debug;

use crate::Result;

/// Placeholder avatar for users created without one.
pub const DEFAULT_AVATAR_URL: &str = "https://media.istockphoto.com/vectors/default-placeholder-profile-icon-vector-id666545148?k=6&m=666545148&s=170667a&w=0&h=ycJvJHz6ZMWsErum0XpjVabgZsP8dib2feSIJ5dIWYk=";

/// Placeholder image for reviews created without one.
pub const DEFAULT_REVIEW_IMG_URL: &str =
   "https://images.pexels.com/photos/163064/play-stone-network-networked-interactive-163064.jpeg";

/// Display name for users created without one.
pub const DEFAULT_NAME: &str = "Anon";

// Millisecond UTC timestamps, so rows created in quick succession still sort
const NOW: &str = "(strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))";

fn statements() -> Vec<String> {
   vec![
      "CREATE TABLE IF NOT EXISTS categories (
         slug TEXT PRIMARY KEY,
         description TEXT NOT NULL DEFAULT ''
      )"
      .to_string(),
      format!(
         "CREATE TABLE IF NOT EXISTS users (
            username TEXT PRIMARY KEY,
            avatar_url TEXT NOT NULL DEFAULT '{DEFAULT_AVATAR_URL}',
            name TEXT NOT NULL DEFAULT '{DEFAULT_NAME}',
            created TEXT NOT NULL DEFAULT {NOW}
         )"
      ),
      format!(
         "CREATE TABLE IF NOT EXISTS reviews (
            review_id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            review_body TEXT NOT NULL,
            designer TEXT NOT NULL,
            review_img_url TEXT NOT NULL DEFAULT '{DEFAULT_REVIEW_IMG_URL}',
            votes INTEGER NOT NULL DEFAULT 0,
            category TEXT NOT NULL REFERENCES categories(slug) ON DELETE CASCADE,
            owner TEXT NOT NULL REFERENCES users(username) ON DELETE CASCADE,
            created_at TEXT NOT NULL DEFAULT {NOW}
         )"
      ),
      format!(
         "CREATE TABLE IF NOT EXISTS comments (
            comment_id INTEGER PRIMARY KEY,
            author TEXT NOT NULL REFERENCES users(username) ON DELETE CASCADE,
            review_id INTEGER NOT NULL REFERENCES reviews(review_id) ON DELETE CASCADE,
            votes INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT {NOW},
            body TEXT NOT NULL
         )"
      ),
      format!(
         "CREATE TABLE IF NOT EXISTS review_likes (
            rl_p_key INTEGER PRIMARY KEY,
            username TEXT NOT NULL REFERENCES users(username) ON DELETE CASCADE,
            review_id INTEGER NOT NULL REFERENCES reviews(review_id) ON DELETE CASCADE,
            liked_at TEXT NOT NULL DEFAULT {NOW},
            UNIQUE (username, review_id)
         )"
      ),
      "CREATE VIEW IF NOT EXISTS review_likers AS
         SELECT review_likes.rl_p_key, review_likes.review_id, users.username,
                users.avatar_url, users.name, review_likes.liked_at
         FROM review_likes
         JOIN users ON users.username = review_likes.username"
         .to_string(),
      "CREATE INDEX IF NOT EXISTS reviews_category_idx ON reviews (category)".to_string(),
      "CREATE INDEX IF NOT EXISTS comments_review_id_idx ON comments (review_id)".to_string(),
      "CREATE INDEX IF NOT EXISTS review_likes_review_id_idx ON review_likes (review_id)"
         .to_string(),
   ]
}

/// Create every table, view and index that does not exist yet, atomically.
pub async fn create_tables(db: &DatabaseWrapper) -> Result<()> {
   let statements = statements()
      .into_iter()
      .map(|sql| (sql, Vec::new()))
      .collect::<Vec<_>>();
   let count = statements.len();

   db.execute_transaction(statements).await?;
   debug!("Applied {count} schema statements");
   Ok(())
}

/// Drop everything [`create_tables`] creates, children first.
pub async fn drop_tables(db: &DatabaseWrapper) -> Result<()> {
   let statements = [
      "DROP VIEW IF EXISTS review_likers",
      "DROP TABLE IF EXISTS review_likes",
      "DROP TABLE IF EXISTS comments",
      "DROP TABLE IF EXISTS reviews",
      "DROP TABLE IF EXISTS categories",
      "DROP TABLE IF EXISTS users",
   ]
   .into_iter()
   .map(|sql| (sql.to_string(), Vec::new()))
   .collect();

   db.execute_transaction(statements).await?;
   debug!("Dropped schema");
   Ok(())
}
