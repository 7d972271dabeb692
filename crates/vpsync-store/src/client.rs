//! MySQL connection management for the vantage point store.

use std::time::Duration;

use sqlx::mysql::{MySqlPool, MySqlPoolOptions};

/// Errors from store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store connection error: {0}")]
    Connection(String),

    #[error("store query error: {0}")]
    Query(#[from] sqlx::Error),

    /// More than one row claims the same hostname. The reconciler matches
    /// rows by hostname, so this cannot be resolved automatically and the
    /// run must abort before touching either row.
    #[error("{count} vantage points share hostname {hostname}")]
    DuplicateHostname { hostname: String, count: usize },
}

/// Connection parameters for the controller database.
///
/// `port` here is the database TCP port from the command line — distinct
/// from the per-node measurement port stored on each vantage point.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub username: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub database: String,
}

impl StoreConfig {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        host: impl Into<String>,
        port: u16,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            host: host.into(),
            port,
            database: "plcontroller".to_string(),
        }
    }

    fn dsn(&self) -> String {
        format!(
            "mysql://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database
        )
    }
}

/// Pooled MySQL client for the `vantage_point` table.
///
/// Clone is cheap (inner pool handle).
#[derive(Clone)]
pub struct StoreClient {
    pub(crate) pool: MySqlPool,
}

impl StoreClient {
    /// Connect to the controller database.
    ///
    /// The connect attempt itself is bounded; a database that is down or
    /// unreachable fails the run here rather than hanging it.
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        let pool = MySqlPoolOptions::new()
            .max_connections(4)
            .acquire_timeout(Duration::from_secs(30))
            .connect(&config.dsn())
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        tracing::info!(
            host = %config.host,
            port = config.port,
            database = %config.database,
            "Connected to vantage point store"
        );
        Ok(Self { pool })
    }
}
