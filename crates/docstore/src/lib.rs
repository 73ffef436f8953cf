//! Document store access for docstore
//!
//! One [`DocumentStore`] trait with two backends:
//! - [`MongoStore`]: a MongoDB server through the official driver
//! - [`MemoryStore`]: an in-process store with the same find, pagination
//!   and `$group` semantics, used when no server is available
//!
//! Results come back through a forward-only [`Cursor`]; typed models go
//! through the [`Document`] trait.

pub mod aggregate;
pub mod config;
pub mod connection;
pub mod cursor;
pub mod document;
pub mod memory;
pub mod mongo;
pub mod query;
pub mod store;
pub mod validation;

pub use aggregate::{total_count, GroupCount, GroupCountPipeline};
pub use config::{Backend, StoreConfig};
pub use connection::{Connection, PoolConfig};
pub use cursor::Cursor;
pub use docstore_common::{DocStoreError, Result};
pub use document::Document;
pub use memory::MemoryStore;
pub use mongo::MongoStore;
pub use query::FindQuery;
pub use store::{DocumentStore, InsertManyOutcome, InsertOneOutcome};
pub use validation::{validate_query, Namespace, ValidatedCollectionName, ValidatedDatabaseName};
