//! Typed documents on top of [`DocumentStore`]
//!
//! Implementing types must be Serialize + DeserializeOwned so they can be
//! converted to and from BSON automatically.

use async_trait::async_trait;
use bson::{oid::ObjectId, Document as BsonDocument};
use docstore_common::{DocStoreError, Result};
use serde::{de::DeserializeOwned, Serialize};

use crate::query::FindQuery;
use crate::store::{DocumentStore, InsertManyOutcome, InsertOneOutcome};
use crate::validation::Namespace;

/// Core trait for typed documents
///
/// # Example
///
/// ```ignore
/// use serde::{Deserialize, Serialize};
/// use docstore::Document;
///
/// #[derive(Debug, Serialize, Deserialize)]
/// struct Note {
///     #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
///     id: Option<ObjectId>,
///     text: String,
/// }
///
/// impl Document for Note {
///     fn collection_name() -> &'static str {
///         "notes"
///     }
/// }
/// ```
#[async_trait]
pub trait Document: Serialize + DeserializeOwned + Send + Sync + Sized {
    /// Default collection for this document type
    fn collection_name() -> &'static str;

    /// Get the document's ObjectId (if it has one)
    fn get_id(&self) -> Option<ObjectId> {
        None
    }

    /// Set the document's ObjectId
    fn set_id(&mut self, _id: ObjectId) {}

    /// Namespace of the default collection inside `database`
    fn namespace(database: &str) -> Result<Namespace> {
        Namespace::new(database, Self::collection_name())
    }

    fn to_bson(&self) -> Result<BsonDocument> {
        bson::to_document(self).map_err(|e| DocStoreError::Serialization(e.to_string()))
    }

    fn from_bson(doc: BsonDocument) -> Result<Self> {
        bson::from_document(doc).map_err(|e| DocStoreError::Deserialization(e.to_string()))
    }

    /// Insert this document, recording the assigned ObjectId
    async fn insert_one(
        &mut self,
        store: &dyn DocumentStore,
        ns: &Namespace,
    ) -> Result<InsertOneOutcome> {
        let outcome = store.insert_one(ns, self.to_bson()?).await?;
        if let Some(id) = outcome.inserted_id.as_object_id() {
            self.set_id(id);
        }
        Ok(outcome)
    }

    async fn insert_many(
        store: &dyn DocumentStore,
        ns: &Namespace,
        items: &[Self],
    ) -> Result<InsertManyOutcome> {
        let docs = items.iter().map(Self::to_bson).collect::<Result<Vec<_>>>()?;
        store.insert_many(ns, docs).await
    }

    /// Find a single document matching the filter
    async fn find_one(
        store: &dyn DocumentStore,
        ns: &Namespace,
        filter: BsonDocument,
    ) -> Result<Option<Self>> {
        store.find_one(ns, filter).await?.map(Self::from_bson).transpose()
    }

    /// Find all documents matching the query
    async fn find(store: &dyn DocumentStore, ns: &Namespace, query: FindQuery) -> Result<Vec<Self>> {
        let mut cursor = store.find(ns, query).await?;
        let docs = cursor.to_vec().await?;
        docs.into_iter().map(Self::from_bson).collect()
    }

    async fn count(store: &dyn DocumentStore, ns: &Namespace, filter: BsonDocument) -> Result<u64> {
        store.count_documents(ns, filter).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use bson::doc;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Note {
        #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
        id: Option<ObjectId>,
        text: String,
        pinned: bool,
    }

    impl Document for Note {
        fn collection_name() -> &'static str {
            "notes"
        }

        fn get_id(&self) -> Option<ObjectId> {
            self.id
        }

        fn set_id(&mut self, id: ObjectId) {
            self.id = Some(id);
        }
    }

    fn note(text: &str, pinned: bool) -> Note {
        Note {
            id: None,
            text: text.to_string(),
            pinned,
        }
    }

    #[test]
    fn test_to_bson_skips_missing_id() {
        let bson = note("hello", true).to_bson().unwrap();
        assert!(!bson.contains_key("_id"));
        assert_eq!(bson.get_str("text").unwrap(), "hello");
        assert!(bson.get_bool("pinned").unwrap());
    }

    #[test]
    fn test_from_bson_missing_field() {
        let err = Note::from_bson(doc! { "text": "x" }).unwrap_err();
        assert!(matches!(err, DocStoreError::Deserialization(_)));
    }

    #[test]
    fn test_namespace_uses_collection_name() {
        let ns = Note::namespace("notes_db").unwrap();
        assert_eq!(ns.to_string(), "notes_db.notes");
    }

    #[tokio::test]
    async fn test_insert_sets_id() {
        let store = MemoryStore::new();
        let ns = Note::namespace("notes_db").unwrap();

        let mut n = note("first", false);
        let outcome = n.insert_one(&store, &ns).await.unwrap();

        assert!(outcome.acknowledged);
        assert_eq!(n.get_id(), outcome.inserted_id.as_object_id());

        let found = Note::find_one(&store, &ns, doc! { "text": "first" }).await.unwrap();
        assert_eq!(found, Some(n));
    }

    #[tokio::test]
    async fn test_typed_find_and_count() {
        let store = MemoryStore::new();
        let ns = Note::namespace("notes_db").unwrap();
        Note::insert_many(&store, &ns, &[note("a", true), note("b", false), note("c", true)])
            .await
            .unwrap();

        let pinned = Note::find(&store, &ns, doc! { "pinned": true }.into()).await.unwrap();
        assert_eq!(pinned.len(), 2);
        assert!(pinned.iter().all(|n| n.id.is_some()));
        assert_eq!(Note::count(&store, &ns, doc! {}).await.unwrap(), 3);
    }
}
