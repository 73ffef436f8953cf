//! MongoDB backend

use async_trait::async_trait;
use bson::{Bson, Document as BsonDocument};
use docstore_common::{DocStoreError, Result};
use futures::TryStreamExt;
use mongodb::options::FindOptions;

use crate::connection::{Connection, PoolConfig};
use crate::cursor::Cursor;
use crate::query::FindQuery;
use crate::store::{DocumentStore, InsertManyOutcome, InsertOneOutcome};
use crate::validation::{validate_query, Namespace};

/// [`DocumentStore`] backed by a MongoDB server
#[derive(Debug, Clone)]
pub struct MongoStore {
    connection: Connection,
}

impl MongoStore {
    /// Connect and ping; fails if the server cannot be reached
    pub async fn connect(uri: &str, config: PoolConfig) -> Result<Self> {
        let connection = Connection::with_config(uri, config).await?;
        connection.ping().await?;
        tracing::info!("Connected to MongoDB");
        Ok(Self { connection })
    }

    pub fn from_connection(connection: Connection) -> Self {
        Self { connection }
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    fn backend_name(&self) -> &'static str {
        "mongo"
    }

    async fn ping(&self) -> Result<()> {
        self.connection.ping().await
    }

    async fn create_collection(&self, ns: &Namespace) -> Result<()> {
        let db = self.connection.database(ns.database());
        let existing = db.list_collection_names().await?;
        if existing.iter().any(|name| name == ns.collection()) {
            tracing::debug!(namespace = %ns, "Collection already exists");
            return Ok(());
        }
        db.create_collection(ns.collection()).await?;
        tracing::debug!(namespace = %ns, "Created collection");
        Ok(())
    }

    async fn insert_one(&self, ns: &Namespace, doc: BsonDocument) -> Result<InsertOneOutcome> {
        let result = self.connection.collection(ns).insert_one(doc).await?;
        Ok(InsertOneOutcome {
            acknowledged: true,
            inserted_id: result.inserted_id,
        })
    }

    async fn insert_many(
        &self,
        ns: &Namespace,
        docs: Vec<BsonDocument>,
    ) -> Result<InsertManyOutcome> {
        if docs.is_empty() {
            return Ok(InsertManyOutcome {
                acknowledged: true,
                inserted_ids: Vec::new(),
            });
        }

        let result = self.connection.collection(ns).insert_many(docs).await?;

        let mut indexed: Vec<(usize, Bson)> = result.inserted_ids.into_iter().collect();
        indexed.sort_by_key(|(index, _)| *index);

        Ok(InsertManyOutcome {
            acknowledged: true,
            inserted_ids: indexed.into_iter().map(|(_, id)| id).collect(),
        })
    }

    async fn find_one(&self, ns: &Namespace, filter: BsonDocument) -> Result<Option<BsonDocument>> {
        validate_query(&Bson::Document(filter.clone()))?;
        let doc = self.connection.collection(ns).find_one(filter).await?;
        Ok(doc)
    }

    async fn find(&self, ns: &Namespace, query: FindQuery) -> Result<Cursor> {
        validate_query(&Bson::Document(query.get_filter().clone()))?;

        let mut options = FindOptions::default();
        options.sort = query.get_sort().cloned();
        options.skip = query.get_skip();
        options.limit = query.get_limit();

        let cursor = self
            .connection
            .collection(ns)
            .find(query.get_filter().clone())
            .with_options(options)
            .await?;

        Ok(Cursor::from_stream(cursor.map_err(DocStoreError::from)))
    }

    async fn aggregate(&self, ns: &Namespace, pipeline: Vec<BsonDocument>) -> Result<Cursor> {
        let stages = Bson::Array(pipeline.iter().cloned().map(Bson::Document).collect());
        validate_query(&stages)?;

        let cursor = self.connection.collection(ns).aggregate(pipeline).await?;
        Ok(Cursor::from_stream(cursor.map_err(DocStoreError::from)))
    }

    async fn count_documents(&self, ns: &Namespace, filter: BsonDocument) -> Result<u64> {
        validate_query(&Bson::Document(filter.clone()))?;
        let count = self.connection.collection(ns).count_documents(filter).await?;
        Ok(count)
    }

    async fn drop_database(&self, database: &str) -> Result<()> {
        self.connection.database(database).drop().await?;
        tracing::debug!(database, "Dropped database");
        Ok(())
    }

    async fn database_exists(&self, database: &str) -> Result<bool> {
        let names = self.connection.list_database_names().await?;
        Ok(names.iter().any(|name| name == database))
    }

    async fn close(&self) -> Result<()> {
        self.connection.shutdown().await;
        tracing::info!("Closed MongoDB connection");
        Ok(())
    }
}
