//! Configuration for the review store connection pools

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for [`SqliteDatabase`](crate::SqliteDatabase) connection pools
///
/// # Examples
///
/// ```
/// use review_store::SqliteDatabaseConfig;
/// use std::time::Duration;
///
/// // Use defaults
/// let config = SqliteDatabaseConfig::default();
///
/// // Override just one field
/// let config = SqliteDatabaseConfig {
///     max_read_connections: 3,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SqliteDatabaseConfig {
   /// Maximum number of concurrent read connections
   ///
   /// Collection listings run their count and page queries on two read
   /// connections at once, so values below 2 serialize them.
   ///
   /// Default: 6
   pub max_read_connections: u32,

   /// Idle timeout for both read and write connections
   ///
   /// Default: 30 seconds
   pub idle_timeout: Duration,

   /// How long a connection waits on a locked database before failing with
   /// `SQLITE_BUSY`.
   ///
   /// Default: 5 seconds
   pub busy_timeout: Duration,
}

impl Default for SqliteDatabaseConfig {
   fn default() -> Self {
      Self {
         max_read_connections: 6,
         idle_timeout: Duration::from_secs(30),
         busy_timeout: Duration::from_secs(5),
      }
   }
}
