//! Test runner - selection, bookkeeping and summary

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Test execution status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestStatus {
    /// Test passed
    Passed,
    /// An assertion did not hold
    Failed,
    /// Test was skipped (deselected or after fail-fast)
    Skipped,
    /// Store error, timeout or panic
    Error,
}

impl std::fmt::Display for TestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestStatus::Passed => write!(f, "PASSED"),
            TestStatus::Failed => write!(f, "FAILED"),
            TestStatus::Skipped => write!(f, "SKIPPED"),
            TestStatus::Error => write!(f, "ERROR"),
        }
    }
}

/// Metadata for a test case
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestMeta {
    /// Case name, e.g. "find all todos"
    pub name: String,
    /// Suite-qualified name, e.g. "todo crud::find all todos"
    pub full_name: String,
    /// Timeout in seconds
    pub timeout: Option<f64>,
    /// Tags for filtering
    pub tags: Vec<String>,
}

impl TestMeta {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            full_name: name.clone(),
            name,
            timeout: None,
            tags: Vec::new(),
        }
    }

    /// Qualify the name with the owning suite
    pub fn in_suite(mut self, suite: &str) -> Self {
        self.full_name = format!("{}::{}", suite, self.name);
        self
    }

    pub fn with_timeout(mut self, timeout: f64) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Timeout for this case, falling back to `default`
    pub fn timeout_or(&self, default: Duration) -> Duration {
        self.timeout
            .filter(|secs| secs.is_finite() && *secs > 0.0)
            .map(Duration::from_secs_f64)
            .unwrap_or(default)
    }
}

/// Test result after execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    /// Test metadata
    pub meta: TestMeta,
    /// Execution status
    pub status: TestStatus,
    /// Duration in milliseconds
    pub duration_ms: u64,
    /// Error message (if failed, errored or skipped)
    pub error: Option<String>,
    /// Timestamp when the case started
    pub started_at: String,
}

impl TestResult {
    fn with_status(
        meta: TestMeta,
        status: TestStatus,
        duration_ms: u64,
        error: Option<String>,
    ) -> Self {
        Self {
            meta,
            status,
            duration_ms,
            error,
            started_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn passed(meta: TestMeta, duration_ms: u64) -> Self {
        Self::with_status(meta, TestStatus::Passed, duration_ms, None)
    }

    pub fn failed(meta: TestMeta, duration_ms: u64, error: impl Into<String>) -> Self {
        Self::with_status(meta, TestStatus::Failed, duration_ms, Some(error.into()))
    }

    pub fn skipped(meta: TestMeta, reason: impl Into<String>) -> Self {
        Self::with_status(meta, TestStatus::Skipped, 0, Some(reason.into()))
    }

    pub fn error(meta: TestMeta, duration_ms: u64, error: impl Into<String>) -> Self {
        Self::with_status(meta, TestStatus::Error, duration_ms, Some(error.into()))
    }

    pub fn is_passed(&self) -> bool {
        self.status == TestStatus::Passed
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, TestStatus::Failed | TestStatus::Error)
    }
}

/// Test runner configuration
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Filter by tags
    pub tags: Vec<String>,
    /// Filter by name substring
    pub name_pattern: Option<String>,
    /// Stop on first failure; remaining cases are skipped
    pub fail_fast: bool,
    /// Timeout for cases that don't set their own
    pub default_timeout: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            tags: Vec::new(),
            name_pattern: None,
            fail_fast: false,
            default_timeout: Duration::from_secs(30),
        }
    }
}

/// Collects results for one run
#[derive(Debug)]
pub struct TestRunner {
    config: RunnerConfig,
    results: Vec<TestResult>,
    start_time: Option<Instant>,
}

impl TestRunner {
    pub fn new(config: RunnerConfig) -> Self {
        Self {
            config,
            results: Vec::new(),
            start_time: None,
        }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Start the run
    pub fn start(&mut self) {
        self.start_time = Some(Instant::now());
        self.results.clear();
    }

    pub fn record(&mut self, result: TestResult) {
        self.results.push(result);
    }

    pub fn results(&self) -> &[TestResult] {
        &self.results
    }

    pub fn into_results(self) -> Vec<TestResult> {
        self.results
    }

    /// True once fail-fast is on and something has failed
    pub fn should_stop(&self) -> bool {
        self.config.fail_fast && self.results.iter().any(TestResult::is_failed)
    }

    pub fn total_duration(&self) -> Duration {
        self.start_time
            .map(|s| s.elapsed())
            .unwrap_or(Duration::ZERO)
    }

    pub fn summary(&self) -> TestSummary {
        TestSummary::from_results(&self.results)
    }

    /// Check if a case passes the configured filters
    pub fn should_run(&self, meta: &TestMeta) -> bool {
        if !self.config.tags.is_empty() && !self.config.tags.iter().any(|t| meta.has_tag(t)) {
            return false;
        }

        if let Some(ref pattern) = self.config.name_pattern {
            if !meta.name.contains(pattern.as_str()) && !meta.full_name.contains(pattern.as_str()) {
                return false;
            }
        }

        true
    }
}

/// Summary of test results
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub errors: usize,
    /// Total duration in ms
    pub total_duration_ms: u64,
}

impl TestSummary {
    pub fn from_results(results: &[TestResult]) -> Self {
        let mut summary = TestSummary::default();

        for result in results {
            match result.status {
                TestStatus::Passed => summary.passed += 1,
                TestStatus::Failed => summary.failed += 1,
                TestStatus::Skipped => summary.skipped += 1,
                TestStatus::Error => summary.errors += 1,
            }
            summary.total_duration_ms += result.duration_ms;
        }

        summary.total = results.len();
        summary
    }

    /// Check if all tests passed
    pub fn all_passed(&self) -> bool {
        self.failed == 0 && self.errors == 0
    }

    /// Pass rate (0.0 - 1.0) over cases that actually ran
    pub fn pass_rate(&self) -> f64 {
        let ran = self.total - self.skipped;
        if ran == 0 {
            return 1.0;
        }
        self.passed as f64 / ran as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_creation() {
        let meta = TestMeta::new("find all todos")
            .in_suite("todo crud")
            .with_timeout(5.0)
            .with_tags(vec!["read".to_string(), "cursor".to_string()]);

        assert_eq!(meta.name, "find all todos");
        assert_eq!(meta.full_name, "todo crud::find all todos");
        assert_eq!(meta.timeout, Some(5.0));
        assert!(meta.has_tag("cursor"));
        assert!(!meta.has_tag("write"));
    }

    #[test]
    fn test_timeout_fallback() {
        let default = Duration::from_secs(30);
        assert_eq!(TestMeta::new("a").timeout_or(default), default);
        assert_eq!(
            TestMeta::new("a").with_timeout(0.5).timeout_or(default),
            Duration::from_millis(500)
        );
        assert_eq!(TestMeta::new("a").with_timeout(-1.0).timeout_or(default), default);
    }

    #[test]
    fn test_runner_summary() {
        let mut runner = TestRunner::new(RunnerConfig::default());
        runner.start();

        runner.record(TestResult::passed(TestMeta::new("create document"), 10));
        runner.record(TestResult::passed(TestMeta::new("find document"), 20));
        runner.record(TestResult::failed(TestMeta::new("find by criteria"), 30, "Expected 1 to equal 2"));
        runner.record(TestResult::skipped(TestMeta::new("count documents"), "deselected"));

        let summary = runner.summary();
        assert_eq!(summary.total, 4);
        assert_eq!(summary.passed, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.total_duration_ms, 60);
        assert!(!summary.all_passed());
        assert!((summary.pass_rate() - 2.0 / 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_name_filter() {
        let runner = TestRunner::new(RunnerConfig {
            name_pattern: Some("find".to_string()),
            ..Default::default()
        });
        assert!(runner.should_run(&TestMeta::new("find limit results / pages")));
        assert!(!runner.should_run(&TestMeta::new("aggregate group")));
    }

    #[test]
    fn test_tag_filter() {
        let runner = TestRunner::new(RunnerConfig {
            tags: vec!["aggregate".to_string(), "write".to_string()],
            ..Default::default()
        });
        let tagged = |tags: &[&str]| {
            TestMeta::new("case").with_tags(tags.iter().map(|t| t.to_string()).collect())
        };
        assert!(runner.should_run(&tagged(&["aggregate"])));
        assert!(runner.should_run(&tagged(&["read", "write"])));
        assert!(!runner.should_run(&tagged(&["read", "cursor"])));
        assert!(!runner.should_run(&TestMeta::new("untagged")));
    }

    #[test]
    fn test_tag_and_name_filters_combine() {
        let runner = TestRunner::new(RunnerConfig {
            tags: vec!["read".to_string()],
            name_pattern: Some("count".to_string()),
            ..Default::default()
        });
        let read = |name: &str| TestMeta::new(name).with_tags(vec!["read".to_string()]);
        assert!(runner.should_run(&read("count documents")));
        assert!(!runner.should_run(&read("find document")));
    }

    #[test]
    fn test_fail_fast_stop() {
        let mut runner = TestRunner::new(RunnerConfig {
            fail_fast: true,
            ..Default::default()
        });
        runner.start();
        runner.record(TestResult::passed(TestMeta::new("a"), 1));
        assert!(!runner.should_stop());
        runner.record(TestResult::error(TestMeta::new("b"), 1, "timed out"));
        assert!(runner.should_stop());
    }
}
