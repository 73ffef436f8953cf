//! MongoDB connection management with pool configuration and health checking

use bson::doc;
use docstore_common::{DocStoreError, Result};
use mongodb::{
    options::{ClientOptions, ServerApi, ServerApiVersion},
    Client, Collection, Database,
};
use std::time::Duration;

use crate::validation::Namespace;

/// Connection pool configuration
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Minimum number of connections in the pool (default: none)
    pub min_pool_size: Option<u32>,
    /// Maximum number of connections in the pool (default: 10)
    pub max_pool_size: Option<u32>,
    /// Maximum time a connection can remain idle before being closed (default: none)
    pub max_idle_time: Option<Duration>,
    /// Connection timeout (default: 10s)
    pub connect_timeout: Option<Duration>,
    /// Server selection timeout (default: 5s)
    pub server_selection_timeout: Option<Duration>,
    /// Application name for server logs
    pub app_name: Option<String>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            // Requests are issued one at a time, so no warm connections
            min_pool_size: None,
            max_pool_size: Some(10),
            max_idle_time: None,
            connect_timeout: Some(Duration::from_secs(10)),
            // An unreachable server should abort setup quickly
            server_selection_timeout: Some(Duration::from_secs(5)),
            app_name: Some("docstore".to_string()),
        }
    }
}

/// MongoDB connection manager with pooling support
#[derive(Debug, Clone)]
pub struct Connection {
    client: Client,
}

impl Connection {
    /// Create a new MongoDB connection with default pool settings
    pub async fn new(connection_string: &str) -> Result<Self> {
        Self::with_config(connection_string, PoolConfig::default()).await
    }

    /// Create a new MongoDB connection with custom pool configuration
    ///
    /// The driver connects lazily; call [`Connection::ping`] to find out
    /// whether the server is reachable.
    pub async fn with_config(connection_string: &str, config: PoolConfig) -> Result<Self> {
        let mut client_options = ClientOptions::parse(connection_string)
            .await
            .map_err(|e| DocStoreError::Configuration(format!("Invalid connection string: {}", e)))?;

        if let Some(min) = config.min_pool_size {
            client_options.min_pool_size = Some(min);
        }
        if let Some(max) = config.max_pool_size {
            client_options.max_pool_size = Some(max);
        }
        if let Some(idle) = config.max_idle_time {
            client_options.max_idle_time = Some(idle);
        }
        if let Some(connect) = config.connect_timeout {
            client_options.connect_timeout = Some(connect);
        }
        if let Some(server_sel) = config.server_selection_timeout {
            client_options.server_selection_timeout = Some(server_sel);
        }
        if let Some(app) = config.app_name {
            client_options.app_name = Some(app);
        }

        // Set stable API version for compatibility
        let server_api = ServerApi::builder().version(ServerApiVersion::V1).build();
        client_options.server_api = Some(server_api);

        let client = Client::with_options(client_options)?;

        Ok(Self { client })
    }

    /// Get a reference to the client
    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn database(&self, name: &str) -> Database {
        self.client.database(name)
    }

    /// Untyped collection for a namespace
    pub fn collection(&self, ns: &Namespace) -> Collection<bson::Document> {
        self.client.database(ns.database()).collection(ns.collection())
    }

    /// Check if the connection is healthy by pinging the server
    pub async fn ping(&self) -> Result<()> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .map(|_| ())
            .map_err(|e| DocStoreError::Connection(format!("Ping failed: {}", e)))
    }

    /// List all database names on the server
    pub async fn list_database_names(&self) -> Result<Vec<String>> {
        let names = self.client.list_database_names().await?;
        Ok(names)
    }

    /// Close every pooled connection
    pub async fn shutdown(&self) {
        self.client.clone().shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pool_config() {
        let config = PoolConfig::default();
        assert_eq!(config.min_pool_size, None);
        assert_eq!(config.max_pool_size, Some(10));
        assert_eq!(config.server_selection_timeout, Some(Duration::from_secs(5)));
        assert_eq!(config.app_name, Some("docstore".to_string()));
    }

    #[tokio::test]
    async fn test_invalid_connection_string() {
        let err = Connection::new("not-a-uri").await.unwrap_err();
        assert!(matches!(err, DocStoreError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_connect_is_lazy() {
        // Parsing succeeds without a reachable server
        let conn = Connection::new("mongodb://localhost:27017").await;
        assert!(conn.is_ok());
    }
}
