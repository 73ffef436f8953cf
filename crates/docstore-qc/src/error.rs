//! Harness error types

use docstore_common::DocStoreError;
use std::time::Duration;
use thiserror::Error;

use crate::assertions::AssertionError;

/// Why a single case did not pass
#[derive(Debug, Error)]
pub enum CaseError {
    /// An expectation did not hold
    #[error("{0}")]
    Assertion(#[from] AssertionError),

    /// The store call itself failed
    #[error("store error: {0}")]
    Store(#[from] DocStoreError),
}

impl CaseError {
    pub fn is_assertion(&self) -> bool {
        matches!(self, CaseError::Assertion(_))
    }
}

/// Failures of the run around the cases
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("setup failed: {0}")]
    Setup(String),

    #[error("teardown failed: {0}")]
    Teardown(String),

    #[error("'{name}' timed out after {timeout:?}")]
    Timeout { name: String, timeout: Duration },

    #[error(transparent)]
    Store(#[from] DocStoreError),
}

pub type HarnessResult<T> = std::result::Result<T, HarnessError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_error_from_assertion() {
        let err: CaseError = AssertionError::new("Expected 8 to equal 9", "to_equal").into();
        assert!(err.is_assertion());
        assert_eq!(err.to_string(), "Expected 8 to equal 9");
    }

    #[test]
    fn test_case_error_from_store() {
        let err: CaseError = DocStoreError::Query("unknown operator".into()).into();
        assert!(!err.is_assertion());
        assert_eq!(err.to_string(), "store error: Query error: unknown operator");
    }

    #[test]
    fn test_timeout_display() {
        let err = HarnessError::Timeout {
            name: "find all todos".into(),
            timeout: Duration::from_secs(2),
        };
        assert_eq!(err.to_string(), "'find all todos' timed out after 2s");
    }
}
