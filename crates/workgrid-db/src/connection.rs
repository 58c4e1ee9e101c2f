//! SurrealDB connection management.

use std::env;

use surrealdb::Surreal;
use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use tracing::info;

use crate::error::DbError;

/// Configuration for connecting to SurrealDB.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// WebSocket URL (e.g., `127.0.0.1:8000`).
    pub url: String,
    /// SurrealDB namespace.
    pub namespace: String,
    /// SurrealDB database name.
    pub database: String,
    /// Root username for authentication.
    pub username: String,
    /// Root password for authentication.
    pub password: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: "127.0.0.1:8000".into(),
            namespace: "workgrid".into(),
            database: "main".into(),
            username: "root".into(),
            password: "root".into(),
        }
    }
}

impl DbConfig {
    /// Build a config from `WORKGRID_DB_*` environment variables,
    /// falling back to the defaults for anything unset.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            url: env::var("WORKGRID_DB_URL").unwrap_or(defaults.url),
            namespace: env::var("WORKGRID_DB_NAMESPACE").unwrap_or(defaults.namespace),
            database: env::var("WORKGRID_DB_DATABASE").unwrap_or(defaults.database),
            username: env::var("WORKGRID_DB_USERNAME").unwrap_or(defaults.username),
            password: env::var("WORKGRID_DB_PASSWORD").unwrap_or(defaults.password),
        }
    }
}

/// Manages a connection to SurrealDB.
#[derive(Clone)]
pub struct DbManager {
    db: Surreal<Client>,
}

impl DbManager {
    /// Connect to SurrealDB using the provided configuration.
    ///
    /// Connection-phase failures are availability failures by
    /// definition and are reported as [`DbError::Unavailable`].
    pub async fn connect(config: &DbConfig) -> Result<Self, DbError> {
        info!(
            url = %config.url,
            namespace = %config.namespace,
            database = %config.database,
            "Connecting to SurrealDB"
        );

        let db = Surreal::new::<Ws>(&config.url)
            .await
            .map_err(|e| DbError::Unavailable(e.to_string()))?;

        db.signin(Root {
            username: &config.username,
            password: &config.password,
        })
        .await
        .map_err(|e| DbError::Unavailable(e.to_string()))?;

        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await
            .map_err(|e| DbError::Unavailable(e.to_string()))?;

        info!("Successfully connected to SurrealDB");

        Ok(Self { db })
    }

    /// Returns a reference to the underlying SurrealDB client.
    pub fn client(&self) -> &Surreal<Client> {
        &self.db
    }
}
