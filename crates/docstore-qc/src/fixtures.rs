//! Suite-scoped fixtures
//!
//! A fixture builds the shared context once before the first case and
//! tears it down once after the last one.
//!
//! # Example
//! ```rust,ignore
//! struct Scratch;
//!
//! #[async_trait]
//! impl SuiteFixture for Scratch {
//!     type Context = Arc<dyn DocumentStore>;
//!
//!     fn backend(&self) -> String {
//!         "memory".into()
//!     }
//!
//!     async fn setup(&self) -> HarnessResult<Self::Context> {
//!         Ok(Arc::new(MemoryStore::new()))
//!     }
//!
//!     async fn teardown(&self, store: Self::Context) -> HarnessResult<()> {
//!         store.close().await.map_err(Into::into)
//!     }
//! }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::HarnessResult;

/// Lifecycle phase a fixture hook belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HookType {
    /// Runs once before all cases
    SetupSuite,
    /// Runs once after all cases, whatever their outcome
    TeardownSuite,
}

impl HookType {
    pub fn is_setup(&self) -> bool {
        matches!(self, HookType::SetupSuite)
    }

    pub fn is_teardown(&self) -> bool {
        matches!(self, HookType::TeardownSuite)
    }
}

impl std::fmt::Display for HookType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HookType::SetupSuite => write!(f, "setup_suite"),
            HookType::TeardownSuite => write!(f, "teardown_suite"),
        }
    }
}

#[async_trait]
pub trait SuiteFixture: Send + Sync {
    /// State handed to every case
    type Context: Send + Sync;

    /// Name of the backend the context talks to, for reports
    fn backend(&self) -> String;

    /// Build the context. An error here aborts the run before any case.
    async fn setup(&self) -> HarnessResult<Self::Context>;

    /// Release the context. Always called once setup succeeded.
    async fn teardown(&self, ctx: Self::Context) -> HarnessResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hook_phases() {
        assert!(HookType::SetupSuite.is_setup());
        assert!(!HookType::SetupSuite.is_teardown());
        assert!(HookType::TeardownSuite.is_teardown());
        assert_eq!(HookType::TeardownSuite.to_string(), "teardown_suite");
    }
}
