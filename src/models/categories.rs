use serde::Deserialize;
use serde_json::{Value as JsonValue, json};

use crate::collections::{columns, tables};
use crate::models::parse_body;
use crate::{ApiError, Backend, Result, Row};

/// Body of `POST /api/categories`.
#[derive(Debug, Deserialize)]
pub struct NewCategory {
   pub slug: String,
   #[serde(default)]
   pub description: String,
}

impl Backend {
   /// Every category, by slug.
   pub async fn fetch_categories(&self) -> Result<Vec<Row>> {
      let query = format!("SELECT * FROM {} ORDER BY {} ASC", tables::CATEGORIES, columns::SLUG);
      Ok(self.db.fetch_all(query, vec![]).await?)
   }

   /// Category slugs in their URL form (spaces as underscores).
   pub(crate) async fn category_slugs(&self) -> Result<Vec<String>> {
      Ok(self
         .fetch_categories()
         .await?
         .into_iter()
         .filter_map(|row| {
            row.get(columns::SLUG.as_str())
               .and_then(JsonValue::as_str)
               .map(|slug| slug.replace(' ', "_"))
         })
         .collect())
   }

   pub async fn add_category(&self, body: JsonValue) -> Result<Row> {
      let category: NewCategory = parse_body(body, "{ slug: string, description?: string }")?;

      self
         .db
         .insert(
            tables::CATEGORIES,
            &[columns::SLUG, columns::DESCRIPTION],
            vec![json!(category.slug), json!(category.description)],
         )
         .await
         .map_err(|err| ApiError::from_write(err, Some(ApiError::CategoryTaken), None))
   }
}
