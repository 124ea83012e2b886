use collection_query::{QueryConfig, SqliteDatabaseConfig};
use serde::{Deserialize, Serialize};

/// Settings for [`Backend::connect`](crate::Backend::connect).
///
/// # Examples
///
/// ```
/// use game_reviews::BackendConfig;
///
/// let config: BackendConfig = serde_json::from_str(
///    r#"{ "database": { "maxReadConnections": 2 }, "query": { "defaultPageSize": 20 } }"#,
/// )
/// .unwrap();
/// assert_eq!(config.database.max_read_connections, 2);
/// assert_eq!(config.query.default_page_size, 20);
/// assert!(config.query.not_found_on_empty);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BackendConfig {
   /// Connection pool settings
   pub database: SqliteDatabaseConfig,
   /// Listing defaults (page size, sort direction, empty-result policy)
   pub query: QueryConfig,
}
