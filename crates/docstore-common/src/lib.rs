//! Common utilities for docstore
//!
//! This crate provides the error type shared by the store and harness crates.

pub mod error;

pub use error::{DocStoreError, Result};
