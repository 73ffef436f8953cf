//! Error types for docstore

use thiserror::Error;

/// Result type alias for docstore operations
pub type Result<T> = std::result::Result<T, DocStoreError>;

/// Unified error type for all store operations
#[derive(Error, Debug, Clone)]
pub enum DocStoreError {
    #[error("MongoDB error: {0}")]
    MongoDB(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Duplicate `_id` or an already existing namespace
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DocStoreError {
    /// Returns true if the store could not be reached at all
    pub fn is_connection(&self) -> bool {
        matches!(self, DocStoreError::Connection(_))
    }

    /// Returns true if the error was caused by the request rather than the store
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            DocStoreError::Query(_)
                | DocStoreError::Validation(_)
                | DocStoreError::Conflict(_)
                | DocStoreError::Configuration(_)
        )
    }
}

impl From<serde_json::Error> for DocStoreError {
    fn from(err: serde_json::Error) -> Self {
        DocStoreError::Serialization(err.to_string())
    }
}

// Driver error conversions (when mongodb-errors feature is enabled)
#[cfg(feature = "mongodb-errors")]
impl From<mongodb::error::Error> for DocStoreError {
    fn from(err: mongodb::error::Error) -> Self {
        use mongodb::error::ErrorKind;
        match err.kind.as_ref() {
            ErrorKind::ServerSelection { .. } | ErrorKind::Io(_) | ErrorKind::DnsResolve { .. } => {
                DocStoreError::Connection(err.to_string())
            }
            ErrorKind::InvalidArgument { .. } => DocStoreError::Query(err.to_string()),
            _ => DocStoreError::MongoDB(err.to_string()),
        }
    }
}

#[cfg(feature = "mongodb-errors")]
impl From<bson::ser::Error> for DocStoreError {
    fn from(err: bson::ser::Error) -> Self {
        DocStoreError::Serialization(format!("BSON serialization error: {}", err))
    }
}

#[cfg(feature = "mongodb-errors")]
impl From<bson::de::Error> for DocStoreError {
    fn from(err: bson::de::Error) -> Self {
        DocStoreError::Deserialization(format!("BSON deserialization error: {}", err))
    }
}
