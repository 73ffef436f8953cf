//! Store configuration for runtime backend selection.
//!
//! # Example
//! ```rust,ignore
//! use docstore::StoreConfig;
//!
//! // From environment
//! let config = StoreConfig::from_env()?;
//!
//! // Or explicit configuration
//! let config = StoreConfig::memory();
//!
//! let store = config.connect().await?;
//! ```

use docstore_common::{DocStoreError, Result};
use std::sync::Arc;

use crate::connection::PoolConfig;
use crate::memory::MemoryStore;
use crate::mongo::MongoStore;
use crate::store::DocumentStore;
use crate::validation::Namespace;

pub const DEFAULT_MONGODB_URI: &str = "mongodb://localhost";
pub const DEFAULT_DATABASE: &str = "testing_db";
pub const DEFAULT_COLLECTION: &str = "testing_collection";

/// Which [`DocumentStore`] implementation to connect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    #[default]
    Mongo,
    Memory,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::Mongo => write!(f, "mongo"),
            Backend::Memory => write!(f, "memory"),
        }
    }
}

impl std::str::FromStr for Backend {
    type Err = DocStoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(Backend::Mongo),
            "memory" | "mem" | "in-memory" => Ok(Backend::Memory),
            other => Err(DocStoreError::Configuration(format!(
                "Unknown backend: '{}'. Use 'mongo' or 'memory'.",
                other
            ))),
        }
    }
}

/// Everything needed to reach the store and scope a run
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: Backend,
    pub uri: String,
    pub database: String,
    pub collection: String,
    pub pool: PoolConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            uri: DEFAULT_MONGODB_URI.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
            pool: PoolConfig::default(),
        }
    }
}

impl StoreConfig {
    /// In-memory store with the default names
    pub fn memory() -> Self {
        Self {
            backend: Backend::Memory,
            ..Default::default()
        }
    }

    /// Create configuration from environment variables.
    ///
    /// - `DOCSTORE_BACKEND`: `mongo` (default) or `memory`
    /// - `DOCSTORE_MONGODB_URI`: defaults to `mongodb://localhost`
    /// - `DOCSTORE_DATABASE`: defaults to `testing_db`
    /// - `DOCSTORE_COLLECTION`: defaults to `testing_collection`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Self::from_env`] with an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(backend) = lookup("DOCSTORE_BACKEND") {
            config.backend = backend.parse()?;
        }
        if let Some(uri) = lookup("DOCSTORE_MONGODB_URI") {
            config.uri = uri;
        }
        if let Some(database) = lookup("DOCSTORE_DATABASE") {
            config.database = database;
        }
        if let Some(collection) = lookup("DOCSTORE_COLLECTION") {
            config.collection = collection;
        }
        config.namespace()?;
        Ok(config)
    }

    /// Validated namespace for the configured names
    pub fn namespace(&self) -> Result<Namespace> {
        Namespace::new(&self.database, &self.collection)
    }

    /// Connect the configured backend
    ///
    /// For MongoDB this pings the server, so an unreachable server fails here.
    pub async fn connect(&self) -> Result<Arc<dyn DocumentStore>> {
        tracing::info!(backend = %self.backend, "Connecting to document store");
        match self.backend {
            Backend::Mongo => {
                let store = MongoStore::connect(&self.uri, self.pool.clone()).await?;
                Ok(Arc::new(store))
            }
            Backend::Memory => Ok(Arc::new(MemoryStore::new())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = StoreConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.backend, Backend::Mongo);
        assert_eq!(config.uri, "mongodb://localhost");
        assert_eq!(config.database, "testing_db");
        assert_eq!(config.collection, "testing_collection");
    }

    #[test]
    fn test_overrides() {
        let config = StoreConfig::from_lookup(lookup(&[
            ("DOCSTORE_BACKEND", "Memory"),
            ("DOCSTORE_DATABASE", "ci_db"),
            ("DOCSTORE_COLLECTION", "todos"),
        ]))
        .unwrap();
        assert_eq!(config.backend, Backend::Memory);
        assert_eq!(config.namespace().unwrap().to_string(), "ci_db.todos");
    }

    #[test]
    fn test_unknown_backend() {
        let err = StoreConfig::from_lookup(lookup(&[("DOCSTORE_BACKEND", "redis")])).unwrap_err();
        assert!(matches!(err, DocStoreError::Configuration(_)));
    }

    #[test]
    fn test_invalid_names_rejected() {
        let err = StoreConfig::from_lookup(lookup(&[("DOCSTORE_DATABASE", "bad.name")])).unwrap_err();
        assert!(matches!(err, DocStoreError::Validation(_)));
    }

    #[tokio::test]
    async fn test_connect_memory() {
        let store = StoreConfig::memory().connect().await.unwrap();
        assert_eq!(store.backend_name(), "memory");
        store.ping().await.unwrap();
    }
}
