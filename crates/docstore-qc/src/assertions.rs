//! Assertion engine - expect-style assertions

use bson::Document as BsonDocument;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type for assertions
pub type AssertionResult = Result<(), AssertionError>;

/// Assertion error with context
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct AssertionError {
    /// Error message
    pub message: String,
    /// Expected value (stringified)
    pub expected: Option<String>,
    /// Actual value (stringified)
    pub actual: Option<String>,
    /// Assertion type (e.g., "to_equal", "to_have_length")
    pub assertion_type: String,
}

impl AssertionError {
    /// Create a new assertion error
    pub fn new(message: impl Into<String>, assertion_type: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            expected: None,
            actual: None,
            assertion_type: assertion_type.into(),
        }
    }

    /// Add expected value
    pub fn with_expected(mut self, expected: impl fmt::Debug) -> Self {
        self.expected = Some(format!("{:?}", expected));
        self
    }

    /// Add actual value
    pub fn with_actual(mut self, actual: impl fmt::Debug) -> Self {
        self.actual = Some(format!("{:?}", actual));
        self
    }
}

/// Expectation builder for fluent assertions
#[derive(Debug, Clone)]
pub struct Expectation<T> {
    value: T,
    negated: bool,
}

impl<T> Expectation<T> {
    /// Create a new expectation
    pub fn new(value: T) -> Self {
        Self {
            value,
            negated: false,
        }
    }

    /// Negate the assertion
    pub fn not(mut self) -> Self {
        self.negated = !self.negated;
        self
    }

    /// Get the value
    pub fn value(&self) -> &T {
        &self.value
    }

    fn passes(&self, result: bool) -> bool {
        if self.negated {
            !result
        } else {
            result
        }
    }
}

// =====================
// Equality Assertions
// =====================

impl<T: PartialEq + fmt::Debug> Expectation<T> {
    /// Assert value equals expected
    pub fn to_equal(&self, expected: &T) -> AssertionResult {
        if self.passes(self.value == *expected) {
            Ok(())
        } else {
            let msg = if self.negated {
                format!("Expected value not to equal {:?}, but it did", expected)
            } else {
                format!("Expected {:?} to equal {:?}", self.value, expected)
            };
            Err(AssertionError::new(msg, "to_equal")
                .with_expected(expected)
                .with_actual(&self.value))
        }
    }
}

// =====================
// Boolean Assertions
// =====================

impl Expectation<bool> {
    /// Assert value is true
    pub fn to_be_true(&self) -> AssertionResult {
        if self.passes(self.value) {
            Ok(())
        } else {
            let msg = if self.negated {
                "Expected value to be false, but was true"
            } else {
                "Expected value to be true, but was false"
            };
            Err(AssertionError::new(msg, "to_be_true").with_actual(self.value))
        }
    }

    /// Assert value is false
    pub fn to_be_false(&self) -> AssertionResult {
        if self.passes(!self.value) {
            Ok(())
        } else {
            let msg = if self.negated {
                "Expected value to be true, but was false"
            } else {
                "Expected value to be false, but was true"
            };
            Err(AssertionError::new(msg, "to_be_false").with_actual(self.value))
        }
    }
}

// =====================
// Option Assertions
// =====================

impl<T: fmt::Debug> Expectation<Option<T>> {
    /// Assert option is Some
    pub fn to_be_some(&self) -> AssertionResult {
        if self.passes(self.value.is_some()) {
            Ok(())
        } else {
            let msg = if self.negated {
                format!("Expected None, but got {:?}", self.value)
            } else {
                "Expected Some, but got None".to_string()
            };
            Err(AssertionError::new(msg, "to_be_some"))
        }
    }

    /// Assert option is None
    pub fn to_be_none(&self) -> AssertionResult {
        if self.passes(self.value.is_none()) {
            Ok(())
        } else {
            let msg = if self.negated {
                "Expected Some, but got None".to_string()
            } else {
                format!("Expected None, but got {:?}", self.value)
            };
            Err(AssertionError::new(msg, "to_be_none"))
        }
    }
}

// =====================
// Numeric Assertions
// =====================

impl<T: PartialOrd + fmt::Debug> Expectation<T> {
    /// Assert value is greater than expected
    pub fn to_be_greater_than(&self, expected: &T) -> AssertionResult {
        if self.passes(self.value > *expected) {
            Ok(())
        } else {
            let msg = if self.negated {
                format!("Expected {:?} not to be greater than {:?}", self.value, expected)
            } else {
                format!("Expected {:?} to be greater than {:?}", self.value, expected)
            };
            Err(AssertionError::new(msg, "to_be_greater_than")
                .with_expected(expected)
                .with_actual(&self.value))
        }
    }

    /// Assert value is less than or equal to expected
    pub fn to_be_at_most(&self, expected: &T) -> AssertionResult {
        if self.passes(self.value <= *expected) {
            Ok(())
        } else {
            let msg = format!("Expected {:?} to be at most {:?}", self.value, expected);
            Err(AssertionError::new(msg, "to_be_at_most")
                .with_expected(expected)
                .with_actual(&self.value))
        }
    }
}

// =====================
// Collection Assertions
// =====================

impl<T: PartialEq + fmt::Debug> Expectation<&[T]> {
    /// Assert slice contains item
    pub fn to_contain_item(&self, item: &T) -> AssertionResult {
        if self.passes(self.value.contains(item)) {
            Ok(())
        } else {
            let msg = if self.negated {
                format!("Expected collection not to contain {:?}", item)
            } else {
                format!("Expected collection to contain {:?}", item)
            };
            Err(AssertionError::new(msg, "to_contain").with_expected(item))
        }
    }

    /// Assert slice has exact length
    pub fn to_have_length(&self, length: usize) -> AssertionResult {
        let actual_len = self.value.len();
        if self.passes(actual_len == length) {
            Ok(())
        } else {
            let msg = format!(
                "Expected collection length to be {}, but was {}",
                length, actual_len
            );
            Err(AssertionError::new(msg, "to_have_length")
                .with_expected(length)
                .with_actual(actual_len))
        }
    }

    /// Assert slice is empty
    pub fn to_be_empty(&self) -> AssertionResult {
        if self.passes(self.value.is_empty()) {
            Ok(())
        } else {
            let msg = if self.negated {
                "Expected collection not to be empty"
            } else {
                "Expected collection to be empty"
            };
            Err(AssertionError::new(msg, "to_be_empty"))
        }
    }
}

// =====================
// Document Assertions
// =====================

impl Expectation<&BsonDocument> {
    /// Assert document has a top-level field
    pub fn to_have_key(&self, key: &str) -> AssertionResult {
        if self.passes(self.value.contains_key(key)) {
            Ok(())
        } else {
            let msg = if self.negated {
                format!("Expected document not to have key {:?}", key)
            } else {
                format!("Expected document to have key {:?}, got {}", key, self.value)
            };
            Err(AssertionError::new(msg, "to_have_key").with_expected(key))
        }
    }

    /// Assert a string field holds `expected`
    pub fn to_have_str(&self, key: &str, expected: &str) -> AssertionResult {
        let actual = self.value.get_str(key).ok();
        if self.passes(actual == Some(expected)) {
            Ok(())
        } else {
            let msg = format!(
                "Expected field {:?} to be {:?}, but was {:?}",
                key, expected, actual
            );
            Err(AssertionError::new(msg, "to_have_str")
                .with_expected(expected)
                .with_actual(actual))
        }
    }
}

// =====================
// Helper Functions
// =====================

/// Create an expectation (entry point)
pub fn expect<T>(value: T) -> Expectation<T> {
    Expectation::new(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn test_to_equal() {
        assert!(expect(42).to_equal(&42).is_ok());
        assert!(expect(42).to_equal(&43).is_err());
        assert!(expect(42).not().to_equal(&43).is_ok());
    }

    #[test]
    fn test_to_equal_error_context() {
        let err = expect(8usize).to_equal(&9).unwrap_err();
        assert_eq!(err.assertion_type, "to_equal");
        assert_eq!(err.expected.as_deref(), Some("9"));
        assert_eq!(err.actual.as_deref(), Some("8"));
        assert_eq!(err.to_string(), "Expected 8 to equal 9");
    }

    #[test]
    fn test_boolean_assertions() {
        assert!(expect(true).to_be_true().is_ok());
        assert!(expect(false).to_be_true().is_err());
        assert!(expect(false).to_be_false().is_ok());
        assert!(expect(true).not().to_be_false().is_ok());
    }

    #[test]
    fn test_option_assertions() {
        assert!(expect(Some(42)).to_be_some().is_ok());
        assert!(expect(None::<i32>).to_be_none().is_ok());
        assert!(expect(None::<i32>).not().to_be_some().is_ok());
        assert!(expect(Some(1)).to_be_none().is_err());
    }

    #[test]
    fn test_numeric_assertions() {
        assert!(expect(10).to_be_greater_than(&5).is_ok());
        assert!(expect(5).to_be_greater_than(&10).is_err());
        assert!(expect(3).to_be_at_most(&3).is_ok());
        assert!(expect(4).to_be_at_most(&3).is_err());
    }

    #[test]
    fn test_collection_assertions() {
        let items = vec![1, 2, 3];
        assert!(expect(items.as_slice()).to_contain_item(&2).is_ok());
        assert!(expect(items.as_slice()).to_have_length(3).is_ok());
        assert!(expect(items.as_slice()).to_have_length(2).is_err());
        assert!(expect(items.as_slice()).not().to_be_empty().is_ok());
    }

    #[test]
    fn test_document_assertions() {
        let todo = doc! { "title": "Do some Teardown", "status": "DONE" };
        assert!(expect(&todo).to_have_key("title").is_ok());
        assert!(expect(&todo).to_have_key("_id").is_err());
        assert!(expect(&todo).to_have_str("status", "DONE").is_ok());
        assert!(expect(&todo).to_have_str("status", "OPEN").is_err());
        assert!(expect(&todo).not().to_have_str("title", "Do some TDD").is_ok());
    }
}
