#![allow(dead_code)]

use game_reviews::{Backend, BackendConfig, CollectionPage, QueryParams};
use serde_json::json;
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

/// Log to the test writer, filtered by `RUST_LOG`.
pub fn init_tracing() {
   let _ = tracing_subscriber::fmt()
      .with_env_filter(EnvFilter::from_default_env())
      .with_test_writer()
      .try_init();
}

pub async fn create_backend(config: BackendConfig) -> (Backend, TempDir) {
   init_tracing();

   let temp_dir = TempDir::new().expect("Failed to create temp directory");
   let backend = Backend::connect(temp_dir.path().join("reviews.db"), config)
      .await
      .expect("Failed to connect to test database");

   (backend, temp_dir)
}

pub async fn seeded_backend() -> (Backend, TempDir) {
   seeded_backend_with(BackendConfig::default()).await
}

pub async fn seeded_backend_with(config: BackendConfig) -> (Backend, TempDir) {
   let (backend, temp_dir) = create_backend(config).await;
   seed(&backend).await;
   (backend, temp_dir)
}

pub fn params(pairs: &[(&str, &str)]) -> QueryParams {
   pairs
      .iter()
      .map(|(k, v)| (k.to_string(), v.to_string()))
      .collect()
}

/// Integer column `key` of every item, in page order.
pub fn ids(page: &CollectionPage, key: &str) -> Vec<i64> {
   page
      .items
      .iter()
      .map(|row| row[key].as_i64().expect("integer id"))
      .collect()
}

/// Text column `key` of every item, in page order.
pub fn strings(page: &CollectionPage, key: &str) -> Vec<String> {
   page
      .items
      .iter()
      .map(|row| row[key].as_str().expect("text column").to_string())
      .collect()
}

/// Newest first, reviews are 7, 4, 1, 3, 8, 9, 10, 11, 2, 5, 6, 12, 13.
pub const REVIEWS_NEWEST_FIRST: [i64; 13] = [7, 4, 1, 3, 8, 9, 10, 11, 2, 5, 6, 12, 13];

/// Seed four categories, four users, 13 reviews, 8 comments and 4 likes.
///
/// ```text
/// review | owner           | category         | votes | comments
/// -------|-----------------|------------------|-------|---------
///      1 | mallionaire     | euro game        |     1 | 1
///      2 | philippaclaire9 | dexterity        |     5 | 2
///      3 | bainesface      | social deduction |     5 | 3
///      5 | mallionaire     | social deduction |     5 | 1
///      6 | mallionaire     | social deduction |     8 | 1
///     12 | mallionaire     | social deduction |   100 | 0
///  other | mallionaire     | social deduction |  < 17 | 0
/// ```
///
/// No review is in "childrens games". Only review 11's title contains
/// "person".
pub async fn seed(backend: &Backend) {
   let mut statements = Vec::new();

   for (slug, description) in [
      ("euro game", "Abstact games that involve little luck"),
      ("social deduction", "Players attempt to uncover each other's hidden role"),
      ("dexterity", "Games involving physical skill"),
      ("childrens games", "Games suitable for children"),
   ] {
      statements.push((
         "INSERT INTO categories (slug, description) VALUES ($1, $2)".to_string(),
         vec![json!(slug), json!(description)],
      ));
   }

   for (username, name, created) in [
      ("bainesface", "sarah", "2020-01-01T00:00:00.000Z"),
      ("mallionaire", "haz", "2020-02-01T00:00:00.000Z"),
      ("dav3rid", "dave", "2020-03-01T00:00:00.000Z"),
      ("philippaclaire9", "philippa", "2020-04-01T00:00:00.000Z"),
   ] {
      statements.push((
         "INSERT INTO users (username, name, avatar_url, created) VALUES ($1, $2, $3, $4)"
            .to_string(),
         vec![
            json!(username),
            json!(name),
            json!(format!("https://avatars.example/{username}.png")),
            json!(created),
         ],
      ));
   }

   let reviews: [(&str, &str, &str, &str, i64); 13] = [
      ("Agricola", "Uwe Rosenberg", "mallionaire", "euro game", 1),
      ("Jenga", "Leslie Scott", "philippaclaire9", "dexterity", 5),
      ("Ultimate Werewolf", "Akihisa Okui", "bainesface", "social deduction", 5),
      ("Dolor reprehenderit", "Gamey McGameface", "mallionaire", "social deduction", 7),
      ("Proident tempor et.", "Seymour Buttz", "mallionaire", "social deduction", 5),
      ("Occaecat consequat officia in quis commodo.", "Ollie Tabooger", "mallionaire", "social deduction", 8),
      ("Mollit elit qui incididunt veniam occaecat cupidatat", "Avery Wunzboogerz", "mallionaire", "social deduction", 9),
      ("One Night Ultimate Werewolf", "Akihisa Okui", "mallionaire", "social deduction", 10),
      ("A truly Quacking Game; Quacks of Quedlinburg", "Wolfgang Warsch", "mallionaire", "social deduction", 10),
      ("Build you own tour de Yorkshire", "Asger Harding Granerud", "mallionaire", "social deduction", 10),
      ("That's just what an evil person would say!", "Fiona Lohoar", "mallionaire", "social deduction", 8),
      ("Scythe; you're gonna need a bigger table!", "Jamey Stegmaier", "mallionaire", "social deduction", 100),
      ("Settlers of Catan: Don't Settle For Less", "Klaus Teuber", "mallionaire", "social deduction", 16),
   ];

   for (index, (title, designer, owner, category, votes)) in reviews.into_iter().enumerate() {
      let review_id = index as i64 + 1;
      let rank = REVIEWS_NEWEST_FIRST
         .iter()
         .position(|&id| id == review_id)
         .expect("every review is ranked");
      let created_at = format!("2021-01-{:02}T09:00:00.000Z", 25 - rank);

      statements.push((
         "INSERT INTO reviews (review_id, title, review_body, designer, category, owner, votes, created_at) \
          VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
            .to_string(),
         vec![
            json!(review_id),
            json!(title),
            json!(format!("Thoughts on {title}")),
            json!(designer),
            json!(category),
            json!(owner),
            json!(votes),
            json!(created_at),
         ],
      ));
   }

   let comments: [(&str, i64, i64, &str); 8] = [
      ("mallionaire", 3, 16, "I loved this game too!"),
      ("philippaclaire9", 2, 13, "My dog loved this game too!"),
      ("philippaclaire9", 3, 10, "I didn't know dogs could play games."),
      ("bainesface", 2, 16, "EPIC board game!"),
      ("mallionaire", 3, 10, "Now this is a story all about how, board games turned my life upside down"),
      ("philippaclaire9", 1, 0, "Not sure about dogs, but my cat likes to get involved"),
      ("bainesface", 5, 3, "Great game for a rainy afternoon"),
      ("philippaclaire9", 6, 1, "Would play again"),
   ];

   for (index, (author, review_id, votes, body)) in comments.into_iter().enumerate() {
      statements.push((
         "INSERT INTO comments (author, review_id, votes, body, created_at) VALUES ($1, $2, $3, $4, $5)"
            .to_string(),
         vec![
            json!(author),
            json!(review_id),
            json!(votes),
            json!(body),
            json!(format!("2021-02-{:02}T12:00:00.000Z", index + 1)),
         ],
      ));
   }

   for (username, review_id, liked_at) in [
      ("bainesface", 2, "2021-03-03T00:00:00.000Z"),
      ("bainesface", 11, "2021-03-01T00:00:00.000Z"),
      ("philippaclaire9", 11, "2021-03-02T00:00:00.000Z"),
      ("mallionaire", 1, "2021-03-04T00:00:00.000Z"),
   ] {
      statements.push((
         "INSERT INTO review_likes (username, review_id, liked_at) VALUES ($1, $2, $3)".to_string(),
         vec![json!(username), json!(review_id), json!(liked_at)],
      ));
   }

   backend
      .database()
      .execute_transaction(statements)
      .await
      .expect("Failed to seed test database");
}
