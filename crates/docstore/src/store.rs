//! The store abstraction every backend implements

use async_trait::async_trait;
use bson::{Bson, Document as BsonDocument};
use docstore_common::Result;

use crate::aggregate::{GroupCount, GroupCountPipeline};
use crate::cursor::Cursor;
use crate::query::FindQuery;
use crate::validation::Namespace;

/// Result of a single insert
#[derive(Debug, Clone, PartialEq)]
pub struct InsertOneOutcome {
    /// True once the store confirmed the write
    pub acknowledged: bool,
    pub inserted_id: Bson,
}

/// Result of a bulk insert
#[derive(Debug, Clone, PartialEq)]
pub struct InsertManyOutcome {
    pub acknowledged: bool,
    /// Assigned identifiers in input order
    pub inserted_ids: Vec<Bson>,
}

impl InsertManyOutcome {
    pub fn len(&self) -> usize {
        self.inserted_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inserted_ids.is_empty()
    }
}

/// A document database reachable through one connection handle
///
/// Documents are untyped BSON; typed access goes through [`crate::Document`].
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short backend name used in logs and reports
    fn backend_name(&self) -> &'static str;

    /// Check the store is reachable
    async fn ping(&self) -> Result<()>;

    /// Create the collection, or open it if it already exists
    async fn create_collection(&self, ns: &Namespace) -> Result<()>;

    /// Insert one document, assigning `_id` when absent
    async fn insert_one(&self, ns: &Namespace, doc: BsonDocument) -> Result<InsertOneOutcome>;

    /// Insert documents in order
    async fn insert_many(&self, ns: &Namespace, docs: Vec<BsonDocument>)
        -> Result<InsertManyOutcome>;

    /// First document matching the filter in store order
    async fn find_one(&self, ns: &Namespace, filter: BsonDocument) -> Result<Option<BsonDocument>>;

    /// Lazy cursor over the documents matching the query
    async fn find(&self, ns: &Namespace, query: FindQuery) -> Result<Cursor>;

    /// Run an aggregation pipeline
    async fn aggregate(&self, ns: &Namespace, pipeline: Vec<BsonDocument>) -> Result<Cursor>;

    async fn count_documents(&self, ns: &Namespace, filter: BsonDocument) -> Result<u64>;

    /// Drop a whole database with every collection in it
    async fn drop_database(&self, database: &str) -> Result<()>;

    async fn database_exists(&self, database: &str) -> Result<bool>;

    /// Release the connection. The store must not be used afterwards.
    async fn close(&self) -> Result<()>;

    /// Count documents per distinct value of a field
    async fn group_count(
        &self,
        ns: &Namespace,
        pipeline: &GroupCountPipeline,
    ) -> Result<Vec<GroupCount>> {
        let mut cursor = self.aggregate(ns, pipeline.to_pipeline()).await?;
        let rows = cursor.to_vec().await?;
        pipeline.parse_rows(rows)
    }
}
