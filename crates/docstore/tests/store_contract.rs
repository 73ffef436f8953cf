//! Behaviour every DocumentStore backend must share.
//!
//! The MongoDB variants require a running server.
//! Set DOCSTORE_MONGODB_URI (defaults to mongodb://localhost) and run with --ignored.

use bson::{doc, Bson};
use docstore::{
    DocStoreError, DocumentStore, FindQuery, GroupCountPipeline, MemoryStore, MongoStore,
    Namespace, PoolConfig,
};

fn mongo_uri() -> String {
    std::env::var("DOCSTORE_MONGODB_URI").unwrap_or_else(|_| "mongodb://localhost".to_string())
}

async fn seed(store: &dyn DocumentStore, ns: &Namespace) {
    store.create_collection(ns).await.unwrap();
    let outcome = store
        .insert_many(
            ns,
            vec![
                doc! { "title": "a", "status": "DONE", "rank": 3 },
                doc! { "title": "b", "status": "OPEN", "rank": 1 },
                doc! { "title": "c", "status": "OPEN", "rank": 2 },
                doc! { "title": "d", "status": "DONE", "rank": 5 },
                doc! { "title": "e", "status": "OPEN", "rank": 4 },
            ],
        )
        .await
        .unwrap();
    assert!(outcome.acknowledged);
    assert_eq!(outcome.len(), 5);
}

fn titles(docs: &[bson::Document]) -> Vec<&str> {
    docs.iter().map(|d| d.get_str("title").unwrap()).collect()
}

async fn check_contract(store: &dyn DocumentStore, ns: &Namespace) {
    seed(store, ns).await;

    // insert_one assigns an id
    let outcome = store
        .insert_one(ns, doc! { "title": "f", "status": "IN PROGRESS", "rank": 0 })
        .await
        .unwrap();
    assert!(outcome.acknowledged);
    assert!(matches!(outcome.inserted_id, Bson::ObjectId(_)));

    // find_one without filter
    let first = store.find_one(ns, doc! {}).await.unwrap().unwrap();
    assert!(first.contains_key("_id"));

    // cursor drains and is exhausted
    let mut cursor = store.find(ns, FindQuery::new()).await.unwrap();
    assert!(cursor.has_next().await.unwrap());
    let all = cursor.to_vec().await.unwrap();
    assert_eq!(titles(&all), ["a", "b", "c", "d", "e", "f"]);
    assert!(!cursor.has_next().await.unwrap());

    // exact match keeps store order
    let done = store
        .find(ns, doc! { "status": "DONE" }.into())
        .await
        .unwrap()
        .to_vec()
        .await
        .unwrap();
    assert_eq!(titles(&done), ["a", "d"]);

    // skip/limit
    let page = store
        .find(ns, FindQuery::new().skip(2).limit(2))
        .await
        .unwrap()
        .to_vec()
        .await
        .unwrap();
    assert_eq!(titles(&page), ["c", "d"]);

    // negative limit behaves like its absolute value
    let page = store
        .find(ns, FindQuery::new().limit(-2))
        .await
        .unwrap()
        .to_vec()
        .await
        .unwrap();
    assert_eq!(titles(&page), ["a", "b"]);

    // sort before skip/limit
    let page = store
        .find(
            ns,
            FindQuery::new()
                .filter(doc! { "rank": { "$gte": 2 } })
                .sort(doc! { "rank": -1 })
                .limit(3),
        )
        .await
        .unwrap()
        .to_vec()
        .await
        .unwrap();
    assert_eq!(titles(&page), ["d", "e", "a"]);

    // group count
    let mut groups = store
        .group_count(ns, &GroupCountPipeline::by_field("status"))
        .await
        .unwrap();
    groups.sort_by(|a, b| a.key_str().cmp(&b.key_str()));
    let pairs: Vec<_> = groups.iter().map(|g| (g.key_str().unwrap(), g.count)).collect();
    assert_eq!(pairs, [("DONE", 2), ("IN PROGRESS", 1), ("OPEN", 3)]);

    assert_eq!(store.count_documents(ns, doc! {}).await.unwrap(), 6);
    assert_eq!(
        store
            .count_documents(ns, doc! { "status": { "$in": ["DONE", "IN PROGRESS"] } })
            .await
            .unwrap(),
        3
    );

    // JavaScript operators never reach the backend
    let err = store
        .count_documents(ns, doc! { "$where": "this.rank > 1" })
        .await
        .unwrap_err();
    assert!(matches!(err, DocStoreError::Validation(_)));

    // drop removes the database
    assert!(store.database_exists(ns.database()).await.unwrap());
    store.drop_database(ns.database()).await.unwrap();
    assert!(!store.database_exists(ns.database()).await.unwrap());
}

#[tokio::test]
async fn test_memory_store_contract() {
    let store = MemoryStore::new();
    let ns = Namespace::new("contract_db", "items").unwrap();
    check_contract(&store, &ns).await;
    store.close().await.unwrap();
}

#[tokio::test]
#[ignore] // Only run with --ignored flag when MongoDB is available
async fn test_mongo_store_contract() {
    let store = MongoStore::connect(&mongo_uri(), PoolConfig::default())
        .await
        .unwrap();
    let ns = Namespace::new("docstore_contract_db", "items").unwrap();
    store.drop_database(ns.database()).await.unwrap();

    check_contract(&store, &ns).await;
    store.close().await.unwrap();
}

#[tokio::test]
#[ignore] // Only run with --ignored flag when MongoDB is available
async fn test_mongo_ping_and_close() {
    let store = MongoStore::connect(&mongo_uri(), PoolConfig::default())
        .await
        .unwrap();
    store.ping().await.unwrap();
    assert_eq!(store.backend_name(), "mongo");
    store.close().await.unwrap();
}
