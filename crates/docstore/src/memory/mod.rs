//! In-process document store
//!
//! Keeps every database in a `parking_lot::RwLock`ed map. Documents keep
//! insertion order, which is the store order seen by `find` without a sort.
//! Reads take a snapshot, so cursors never hold the lock.

mod compare;
mod filter;
mod pipeline;

use async_trait::async_trait;
use bson::{oid::ObjectId, Bson, Document as BsonDocument};
use docstore_common::{DocStoreError, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::cursor::Cursor;
use crate::query::FindQuery;
use crate::store::{DocumentStore, InsertManyOutcome, InsertOneOutcome};
use crate::validation::{validate_query, Namespace};

type Collections = HashMap<String, Vec<BsonDocument>>;

/// [`DocumentStore`] held entirely in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    databases: RwLock<HashMap<String, Collections>>,
    closed: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of every database currently holding a collection
    pub fn database_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.databases.read().keys().cloned().collect();
        names.sort();
        names
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(DocStoreError::Connection("store has been closed".to_string()));
        }
        Ok(())
    }

    /// Copy of the documents in `ns` matching `filter`, in insertion order
    fn snapshot(&self, ns: &Namespace, filter: &BsonDocument) -> Result<Vec<BsonDocument>> {
        self.ensure_open()?;
        validate_query(&Bson::Document(filter.clone()))?;

        let databases = self.databases.read();
        let Some(docs) = databases
            .get(ns.database())
            .and_then(|collections| collections.get(ns.collection()))
        else {
            return Ok(Vec::new());
        };

        let mut out = Vec::new();
        for doc in docs {
            if filter::matches(doc, filter)? {
                out.push(doc.clone());
            }
        }
        Ok(out)
    }

    /// Insert into an already locked collection, assigning `_id` when absent
    fn insert_locked(docs: &mut Vec<BsonDocument>, doc: BsonDocument) -> Result<Bson> {
        let doc = with_id(doc);
        let id = doc.get("_id").cloned().unwrap_or(Bson::Null);

        if docs.iter().any(|existing| existing.get("_id") == Some(&id)) {
            return Err(DocStoreError::Conflict(format!("duplicate _id {}", id)));
        }

        docs.push(doc);
        Ok(id)
    }
}

/// `_id` first, like the server stores it
fn with_id(doc: BsonDocument) -> BsonDocument {
    if doc.contains_key("_id") {
        return doc;
    }
    let mut out = BsonDocument::new();
    out.insert("_id", ObjectId::new());
    for (key, value) in doc {
        out.insert(key, value);
    }
    out
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<()> {
        self.ensure_open()
    }

    async fn create_collection(&self, ns: &Namespace) -> Result<()> {
        self.ensure_open()?;
        self.databases
            .write()
            .entry(ns.database().to_string())
            .or_default()
            .entry(ns.collection().to_string())
            .or_default();
        tracing::debug!(namespace = %ns, "Opened collection");
        Ok(())
    }

    async fn insert_one(&self, ns: &Namespace, doc: BsonDocument) -> Result<InsertOneOutcome> {
        self.ensure_open()?;
        let mut databases = self.databases.write();
        let docs = databases
            .entry(ns.database().to_string())
            .or_default()
            .entry(ns.collection().to_string())
            .or_default();

        let inserted_id = Self::insert_locked(docs, doc)?;
        Ok(InsertOneOutcome {
            acknowledged: true,
            inserted_id,
        })
    }

    async fn insert_many(
        &self,
        ns: &Namespace,
        docs: Vec<BsonDocument>,
    ) -> Result<InsertManyOutcome> {
        self.ensure_open()?;
        let mut databases = self.databases.write();
        let collection = databases
            .entry(ns.database().to_string())
            .or_default()
            .entry(ns.collection().to_string())
            .or_default();

        // Ordered insert: documents before a failing one stay inserted
        let mut inserted_ids = Vec::with_capacity(docs.len());
        for doc in docs {
            inserted_ids.push(Self::insert_locked(collection, doc)?);
        }

        Ok(InsertManyOutcome {
            acknowledged: true,
            inserted_ids,
        })
    }

    async fn find_one(&self, ns: &Namespace, filter: BsonDocument) -> Result<Option<BsonDocument>> {
        Ok(self.snapshot(ns, &filter)?.into_iter().next())
    }

    async fn find(&self, ns: &Namespace, query: FindQuery) -> Result<Cursor> {
        let mut docs = self.snapshot(ns, query.get_filter())?;

        if let Some(order) = query.get_sort() {
            docs.sort_by(|a, b| compare::compare_by_spec(a, b, order));
        }

        let skip = usize::try_from(query.get_skip().unwrap_or(0)).unwrap_or(usize::MAX);
        let limit = query
            .effective_limit()
            .map(|n| usize::try_from(n).unwrap_or(usize::MAX))
            .unwrap_or(usize::MAX);

        let page: Vec<BsonDocument> = docs.into_iter().skip(skip).take(limit).collect();
        tracing::debug!(namespace = %ns, returned = page.len(), "find");
        Ok(Cursor::from_documents(page))
    }

    async fn aggregate(&self, ns: &Namespace, pipeline: Vec<BsonDocument>) -> Result<Cursor> {
        let stages = Bson::Array(pipeline.iter().cloned().map(Bson::Document).collect());
        validate_query(&stages)?;

        let docs = self.snapshot(ns, &BsonDocument::new())?;
        let rows = pipeline::run(docs, &pipeline)?;
        tracing::debug!(namespace = %ns, stages = pipeline.len(), rows = rows.len(), "aggregate");
        Ok(Cursor::from_documents(rows))
    }

    async fn count_documents(&self, ns: &Namespace, filter: BsonDocument) -> Result<u64> {
        Ok(self.snapshot(ns, &filter)?.len() as u64)
    }

    async fn drop_database(&self, database: &str) -> Result<()> {
        self.ensure_open()?;
        self.databases.write().remove(database);
        tracing::debug!(database, "Dropped database");
        Ok(())
    }

    async fn database_exists(&self, database: &str) -> Result<bool> {
        self.ensure_open()?;
        Ok(self.databases.read().contains_key(database))
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}
