//! docstore-qc: CRUD and aggregation harness for docstore backends
//!
//! A [`Suite`] pairs a [`SuiteFixture`] (setup once, teardown once) with
//! an ordered list of cases. Cases assert with [`expect`] and the run is
//! rendered by a [`Reporter`].
//!
//! # Example
//! ```rust,ignore
//! use docstore::StoreConfig;
//! use docstore_qc::{crud_suite, Reporter, RunnerConfig, TodoFixture};
//!
//! let fixture = TodoFixture::from_config(StoreConfig::memory())?;
//! let report = crud_suite(fixture).run(RunnerConfig::default()).await;
//! println!("{}", Reporter::console().generate(&report)?);
//! assert!(report.all_passed());
//! ```

pub mod assertions;
pub mod error;
pub mod fixtures;
pub mod reporter;
pub mod runner;
pub mod seed;
pub mod suite;
pub mod suites;

pub use assertions::{expect, AssertionError, AssertionResult, Expectation};
pub use error::{CaseError, HarnessError, HarnessResult};
pub use fixtures::{HookType, SuiteFixture};
pub use reporter::{ReportError, ReportFormat, Reporter, TestReport};
pub use runner::{RunnerConfig, TestMeta, TestResult, TestRunner, TestStatus, TestSummary};
pub use seed::{extra_todo, seed_todos, Todo, TodoStatus, SEED_COUNT, SEED_USER};
pub use suite::{CaseFn, CaseFuture, Suite, TestCase};
pub use suites::{crud_suite, TodoContext, TodoFixture, CRUD_SUITE_NAME};
