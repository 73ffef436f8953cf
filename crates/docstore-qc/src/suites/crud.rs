//! Todo CRUD and aggregation suite
//!
//! Setup seeds eight todos into a fresh collection, the cases run in
//! order (the first one inserts a ninth), and teardown drops the whole
//! database and closes the store.

use async_trait::async_trait;
use bson::doc;
use docstore::{
    total_count, Document, DocumentStore, FindQuery, GroupCount, GroupCountPipeline, Namespace,
    StoreConfig,
};
use docstore_common::Result;
use std::fmt::Display;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::assertions::expect;
use crate::error::{HarnessError, HarnessResult};
use crate::fixtures::SuiteFixture;
use crate::seed::{extra_todo, seed_todos, Todo, TodoStatus, SEED_COUNT};
use crate::suite::{CaseFuture, Suite, TestCase};

pub const CRUD_SUITE_NAME: &str = "todo crud";

/// Documents in the collection once "create document" has run
const TOTAL_AFTER_INSERT: u64 = SEED_COUNT + 1;

const PAGE_SIZE: i64 = 3;

/// Shared state for every case
pub struct TodoContext {
    pub store: Arc<dyn DocumentStore>,
    pub namespace: Namespace,
}

enum StoreSource {
    Config(StoreConfig),
    Shared(Arc<dyn DocumentStore>),
}

/// Connects (or borrows) a store and owns the seeded namespace
pub struct TodoFixture {
    source: StoreSource,
    namespace: Namespace,
}

impl TodoFixture {
    /// Connect at setup using `config`
    pub fn from_config(config: StoreConfig) -> Result<Self> {
        let namespace = config.namespace()?;
        Ok(Self {
            source: StoreSource::Config(config),
            namespace,
        })
    }

    /// Run against an already connected store
    pub fn with_store(store: Arc<dyn DocumentStore>, namespace: Namespace) -> Self {
        Self {
            source: StoreSource::Shared(store),
            namespace,
        }
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }
}

fn setup_err(e: impl Display) -> HarnessError {
    HarnessError::Setup(e.to_string())
}

/// Open the collection and make sure no earlier run left documents in it
async fn prepare(store: &dyn DocumentStore, ns: &Namespace) -> HarnessResult<()> {
    store.create_collection(ns).await.map_err(setup_err)?;

    let existing = store.count_documents(ns, doc! {}).await.map_err(setup_err)?;
    if existing != 0 {
        return Err(HarnessError::Setup(format!(
            "{} already holds {} documents",
            ns, existing
        )));
    }
    Ok(())
}

/// Insert the seed set and check it landed in full
async fn populate(store: &dyn DocumentStore, ns: &Namespace) -> HarnessResult<()> {
    let outcome = Todo::insert_many(store, ns, &seed_todos())
        .await
        .map_err(setup_err)?;
    debug!(namespace = %ns, inserted = outcome.len(), "Seeded todos");

    let count = store.count_documents(ns, doc! {}).await.map_err(setup_err)?;
    if count != SEED_COUNT {
        return Err(HarnessError::Setup(format!(
            "expected {} seeded documents in {}, found {}",
            SEED_COUNT, ns, count
        )));
    }
    Ok(())
}

async fn close_after_failed_setup(store: &dyn DocumentStore) {
    if let Err(close_err) = store.close().await {
        warn!(error = %close_err, "Closing store after failed setup");
    }
}

#[async_trait]
impl SuiteFixture for TodoFixture {
    type Context = TodoContext;

    fn backend(&self) -> String {
        match &self.source {
            StoreSource::Config(config) => config.backend.to_string(),
            StoreSource::Shared(store) => store.backend_name().to_string(),
        }
    }

    async fn setup(&self) -> HarnessResult<TodoContext> {
        let store = match &self.source {
            StoreSource::Config(config) => config
                .connect()
                .await
                .map_err(|e| HarnessError::Setup(format!("cannot connect to {}: {}", config.uri, e)))?,
            StoreSource::Shared(store) => store.clone(),
        };

        // Stale documents belong to someone else: leave them in place
        if let Err(e) = prepare(store.as_ref(), &self.namespace).await {
            close_after_failed_setup(store.as_ref()).await;
            return Err(e);
        }

        // Once this run has written, a failure must not leave partial seed data
        if let Err(e) = populate(store.as_ref(), &self.namespace).await {
            let database = self.namespace.database();
            if let Err(drop_err) = store.drop_database(database).await {
                warn!(database = %database, error = %drop_err, "Dropping partly seeded database");
            }
            close_after_failed_setup(store.as_ref()).await;
            return Err(e);
        }

        info!(namespace = %self.namespace, count = SEED_COUNT, "Collection seeded");
        Ok(TodoContext {
            store,
            namespace: self.namespace.clone(),
        })
    }

    async fn teardown(&self, ctx: TodoContext) -> HarnessResult<()> {
        let database = ctx.namespace.database();

        let dropped = match ctx.store.drop_database(database).await {
            Ok(()) => match ctx.store.database_exists(database).await {
                Ok(false) => Ok(()),
                Ok(true) => Err(format!("database '{}' still exists after drop", database)),
                Err(e) => Err(e.to_string()),
            },
            Err(e) => Err(e.to_string()),
        };
        let closed = ctx.store.close().await;

        dropped.map_err(HarnessError::Teardown)?;
        closed.map_err(|e| HarnessError::Teardown(format!("close failed: {}", e)))?;

        info!(database = %database, "Database dropped and store closed");
        Ok(())
    }
}

fn create_document(ctx: &TodoContext) -> CaseFuture<'_> {
    Box::pin(async move {
        let mut todo = extra_todo();
        let outcome = todo.insert_one(ctx.store.as_ref(), &ctx.namespace).await?;

        expect(outcome.acknowledged).to_be_true()?;
        expect(todo.id).to_be_some()?;
        Ok(())
    })
}

fn find_document(ctx: &TodoContext) -> CaseFuture<'_> {
    Box::pin(async move {
        let found = ctx.store.find_one(&ctx.namespace, doc! {}).await?;

        expect(found.as_ref()).to_be_some()?;
        if let Some(doc) = found.as_ref() {
            expect(doc).to_have_key("_id")?;
        }
        Ok(())
    })
}

fn find_all_todos(ctx: &TodoContext) -> CaseFuture<'_> {
    Box::pin(async move {
        let mut cursor = ctx.store.find(&ctx.namespace, FindQuery::new()).await?;
        expect(cursor.has_next().await?).to_be_true()?;

        let docs = cursor.to_vec().await?;
        expect(docs.as_slice()).to_have_length(TOTAL_AFTER_INSERT as usize)?;
        expect(&docs[0]).to_have_key("_id")?;

        expect(cursor.has_next().await?).to_be_false()?;
        Ok(())
    })
}

fn find_by_criteria(ctx: &TodoContext) -> CaseFuture<'_> {
    Box::pin(async move {
        let filter = doc! { "status": TodoStatus::Done.as_str() };
        let done = Todo::find(ctx.store.as_ref(), &ctx.namespace, filter.into()).await?;

        expect(done.len()).to_equal(&2)?;
        expect(done.last().map(|t| t.title.as_str())).to_equal(&Some("Do some Teardown"))?;
        Ok(())
    })
}

fn find_pages(ctx: &TodoContext) -> CaseFuture<'_> {
    Box::pin(async move {
        let first = ctx
            .store
            .find(&ctx.namespace, FindQuery::new().limit(PAGE_SIZE))
            .await?
            .to_vec()
            .await?;
        expect(first.as_slice()).to_have_length(PAGE_SIZE as usize)?;
        expect(&first[0]).to_have_str("title", "Do some TDD setup")?;

        let second = ctx
            .store
            .find(
                &ctx.namespace,
                FindQuery::new().skip(PAGE_SIZE as u64).limit(PAGE_SIZE),
            )
            .await?
            .to_vec()
            .await?;
        expect(second.as_slice()).to_have_length(PAGE_SIZE as usize)?;
        expect(&second[0]).to_have_str("title", "Do Mongoose CRUD")?;
        Ok(())
    })
}

fn aggregate_group(ctx: &TodoContext) -> CaseFuture<'_> {
    Box::pin(async move {
        let pipeline = GroupCountPipeline::by_field("status");
        let groups = ctx.store.group_count(&ctx.namespace, &pipeline).await?;
        info!(
            groups = %serde_json::to_string(&groups).unwrap_or_default(),
            "Todos grouped by status"
        );

        let mut keys: Vec<&str> = groups.iter().filter_map(GroupCount::key_str).collect();
        keys.sort_unstable();
        let expected: Vec<&str> = TodoStatus::ALL.iter().map(TodoStatus::as_str).collect();
        expect(groups.len()).to_equal(&expected.len())?;
        expect(keys).to_equal(&expected)?;

        let total = ctx.store.count_documents(&ctx.namespace, doc! {}).await?;
        expect(total_count(&groups)).to_equal(&total)?;
        Ok(())
    })
}

fn count_documents(ctx: &TodoContext) -> CaseFuture<'_> {
    Box::pin(async move {
        let count = Todo::count(ctx.store.as_ref(), &ctx.namespace, doc! {}).await?;
        expect(count).to_equal(&TOTAL_AFTER_INSERT)?;
        Ok(())
    })
}

/// The ordered CRUD suite over `fixture`
pub fn crud_suite(fixture: TodoFixture) -> Suite<TodoFixture> {
    Suite::new(CRUD_SUITE_NAME, fixture)
        .case(TestCase::new("create document", create_document).with_tags(&["write"]))
        .case(TestCase::new("find document", find_document).with_tags(&["read"]))
        .case(TestCase::new("find all todos", find_all_todos).with_tags(&["read", "cursor"]))
        .case(TestCase::new("find by criteria", find_by_criteria).with_tags(&["read"]))
        .case(TestCase::new("find limit results / pages", find_pages).with_tags(&["read"]))
        .case(TestCase::new("aggregate group", aggregate_group).with_tags(&["aggregate"]))
        .case(TestCase::new("count documents", count_documents).with_tags(&["read"]))
}
