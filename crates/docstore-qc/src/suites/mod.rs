//! Built-in suites

pub mod crud;

pub use crud::{crud_suite, TodoContext, TodoFixture, CRUD_SUITE_NAME};
