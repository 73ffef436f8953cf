//! Input validation for store operations
//!
//! Database and collection names are checked before they reach a backend,
//! and filters/pipelines are scanned for operators that execute server-side
//! JavaScript.

use crate::Result;
use bson::Bson;
use docstore_common::DocStoreError;

/// Maximum allowed length for collection names (MongoDB limit is 255, we're more conservative)
const MAX_COLLECTION_NAME_LENGTH: usize = 120;

/// Maximum allowed length for database names
const MAX_DATABASE_NAME_LENGTH: usize = 64;

/// Characters MongoDB rejects in database names
const FORBIDDEN_DATABASE_CHARS: &[char] = &['/', '\\', '.', ' ', '"', '$', '\0'];

/// Validated collection name
///
/// - Not empty
/// - Maximum 120 characters
/// - No null bytes
/// - No "system." prefix (system collections)
/// - No $ characters (special operators)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValidatedCollectionName {
    name: String,
}

impl ValidatedCollectionName {
    /// Creates a new validated collection name
    pub fn new(name: &str) -> Result<Self> {
        if name.is_empty() {
            return Err(DocStoreError::Validation(
                "Collection name cannot be empty".to_string(),
            ));
        }

        if name.len() > MAX_COLLECTION_NAME_LENGTH {
            return Err(DocStoreError::Validation(format!(
                "Collection name exceeds maximum length of {} characters: '{}'",
                MAX_COLLECTION_NAME_LENGTH, name
            )));
        }

        if name.contains('\0') {
            return Err(DocStoreError::Validation(
                "Collection name cannot contain null bytes".to_string(),
            ));
        }

        if name.starts_with("system.") {
            return Err(DocStoreError::Validation(format!(
                "Collection name cannot start with 'system.' (reserved): '{}'",
                name
            )));
        }

        if name.contains('$') {
            return Err(DocStoreError::Validation(format!(
                "Collection name cannot contain '$' character: '{}'",
                name
            )));
        }

        if name.contains("..") || name.contains("//") {
            tracing::warn!(collection = name, "Collection name contains suspicious pattern");
        }

        Ok(Self {
            name: name.to_string(),
        })
    }

    /// Returns the validated collection name as a string slice
    pub fn as_str(&self) -> &str {
        &self.name
    }
}

impl AsRef<str> for ValidatedCollectionName {
    fn as_ref(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for ValidatedCollectionName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Validated database name
///
/// - Not empty
/// - Maximum 64 bytes
/// - None of `/ \ . " $`, space or NUL
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValidatedDatabaseName {
    name: String,
}

impl ValidatedDatabaseName {
    /// Creates a new validated database name
    pub fn new(name: &str) -> Result<Self> {
        if name.is_empty() {
            return Err(DocStoreError::Validation(
                "Database name cannot be empty".to_string(),
            ));
        }

        if name.len() > MAX_DATABASE_NAME_LENGTH {
            return Err(DocStoreError::Validation(format!(
                "Database name exceeds maximum length of {} bytes: '{}'",
                MAX_DATABASE_NAME_LENGTH, name
            )));
        }

        if let Some(c) = name.chars().find(|c| FORBIDDEN_DATABASE_CHARS.contains(c)) {
            return Err(DocStoreError::Validation(format!(
                "Database name cannot contain {:?}: '{}'",
                c, name
            )));
        }

        Ok(Self {
            name: name.to_string(),
        })
    }

    /// Returns the validated database name as a string slice
    pub fn as_str(&self) -> &str {
        &self.name
    }
}

impl AsRef<str> for ValidatedDatabaseName {
    fn as_ref(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for ValidatedDatabaseName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A `(database, collection)` pair every store operation is scoped to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace {
    database: ValidatedDatabaseName,
    collection: ValidatedCollectionName,
}

impl Namespace {
    /// Validate both names and build a namespace
    pub fn new(database: &str, collection: &str) -> Result<Self> {
        Ok(Self {
            database: ValidatedDatabaseName::new(database)?,
            collection: ValidatedCollectionName::new(collection)?,
        })
    }

    pub fn database(&self) -> &str {
        self.database.as_str()
    }

    pub fn collection(&self) -> &str {
        self.collection.as_str()
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.database, self.collection)
    }
}

/// Operators that run JavaScript on the server
const DANGEROUS_OPERATORS: &[&str] = &[
    "$where",
    "$function",
    "$accumulator",
];

/// Rejects filters and pipeline stages that contain JavaScript operators
pub fn validate_query(query: &Bson) -> Result<()> {
    match query {
        Bson::Document(doc) => {
            for (key, value) in doc.iter() {
                if DANGEROUS_OPERATORS.contains(&key.as_str()) {
                    return Err(DocStoreError::Validation(format!(
                        "Dangerous operator '{}' is not allowed",
                        key
                    )));
                }
                validate_query(value)?;
            }
            Ok(())
        }
        Bson::Array(items) => items.iter().try_for_each(validate_query),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn test_valid_collection_names() {
        assert!(ValidatedCollectionName::new("testing_collection").is_ok());
        assert!(ValidatedCollectionName::new("todos.archive").is_ok());
    }

    #[test]
    fn test_invalid_collection_names() {
        assert!(ValidatedCollectionName::new("").is_err());
        assert!(ValidatedCollectionName::new("system.users").is_err());
        assert!(ValidatedCollectionName::new("todo$s").is_err());
        assert!(ValidatedCollectionName::new("to\0dos").is_err());
        assert!(ValidatedCollectionName::new(&"a".repeat(121)).is_err());
    }

    #[test]
    fn test_valid_database_names() {
        assert!(ValidatedDatabaseName::new("testing_db").is_ok());
        assert!(ValidatedDatabaseName::new("run-42").is_ok());
    }

    #[test]
    fn test_invalid_database_names() {
        assert!(ValidatedDatabaseName::new("").is_err());
        assert!(ValidatedDatabaseName::new("testing.db").is_err());
        assert!(ValidatedDatabaseName::new("testing db").is_err());
        assert!(ValidatedDatabaseName::new("a/b").is_err());
        assert!(ValidatedDatabaseName::new(&"d".repeat(65)).is_err());
    }

    #[test]
    fn test_namespace_display() {
        let ns = Namespace::new("testing_db", "testing_collection").unwrap();
        assert_eq!(ns.database(), "testing_db");
        assert_eq!(ns.collection(), "testing_collection");
        assert_eq!(ns.to_string(), "testing_db.testing_collection");
    }

    #[test]
    fn test_validate_query_allows_plain_filters() {
        let filter = doc! {
            "$or": [ { "status": "DONE" }, { "status": { "$in": ["OPEN"] } } ]
        };
        assert!(validate_query(&Bson::Document(filter)).is_ok());
    }

    #[test]
    fn test_validate_query_rejects_where() {
        let filter = doc! { "$and": [ { "$where": "this.a == 1" } ] };
        let err = validate_query(&Bson::Document(filter)).unwrap_err();
        assert!(matches!(err, DocStoreError::Validation(_)));
    }

    #[test]
    fn test_validate_query_rejects_accumulator_in_pipeline() {
        let pipeline = Bson::Array(vec![Bson::Document(doc! {
            "$group": { "_id": "$status", "x": { "$accumulator": {} } }
        })]);
        assert!(validate_query(&pipeline).is_err());
    }
}
