//! Ordered case execution around a [`SuiteFixture`]

use futures::future::BoxFuture;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use crate::error::{CaseError, HarnessError};
use crate::fixtures::{HookType, SuiteFixture};
use crate::reporter::TestReport;
use crate::runner::{RunnerConfig, TestMeta, TestResult, TestRunner, TestStatus};

pub type CaseFuture<'a> = BoxFuture<'a, Result<(), CaseError>>;

/// Body of a case: borrows the suite context for the duration of the call
pub type CaseFn<C> = for<'a> fn(&'a C) -> CaseFuture<'a>;

pub struct TestCase<C> {
    pub meta: TestMeta,
    run: CaseFn<C>,
}

impl<C> TestCase<C> {
    pub fn new(name: impl Into<String>, run: CaseFn<C>) -> Self {
        Self {
            meta: TestMeta::new(name),
            run,
        }
    }

    pub fn with_timeout(mut self, secs: f64) -> Self {
        self.meta = self.meta.with_timeout(secs);
        self
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.meta = self.meta.with_tags(tags.iter().map(|t| t.to_string()).collect());
        self
    }
}

impl<C> std::fmt::Debug for TestCase<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestCase").field("meta", &self.meta).finish()
    }
}

/// A fixture plus the cases that share its context, run in order
pub struct Suite<F: SuiteFixture> {
    name: String,
    fixture: F,
    cases: Vec<TestCase<F::Context>>,
}

impl<F: SuiteFixture> Suite<F> {
    pub fn new(name: impl Into<String>, fixture: F) -> Self {
        Self {
            name: name.into(),
            fixture,
            cases: Vec::new(),
        }
    }

    pub fn case(mut self, mut case: TestCase<F::Context>) -> Self {
        case.meta = case.meta.in_suite(&self.name);
        self.cases.push(case);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cases(&self) -> &[TestCase<F::Context>] {
        &self.cases
    }

    /// Run setup, every selected case in order, then teardown.
    ///
    /// Teardown runs whenever setup succeeded, including after failed,
    /// panicking or timed-out cases.
    pub async fn run(&self, config: RunnerConfig) -> TestReport {
        let backend = self.fixture.backend();
        let mut runner = TestRunner::new(config);
        runner.start();

        info!(suite = %self.name, backend = %backend, hook = %HookType::SetupSuite, "Starting suite");

        let ctx = match self.fixture.setup().await {
            Ok(ctx) => ctx,
            Err(e) => {
                error!(suite = %self.name, error = %e, "Suite setup failed; no cases run");
                return TestReport::new(&self.name, backend, Vec::new())
                    .with_setup_error(e.to_string());
            }
        };

        for case in &self.cases {
            let result = self.run_one(&runner, case, &ctx).await;
            runner.record(result);
        }

        info!(suite = %self.name, hook = %HookType::TeardownSuite, "Tearing down suite");
        let teardown = self.fixture.teardown(ctx).await;

        let duration_ms = runner.total_duration().as_millis() as u64;
        let mut report = TestReport::new(&self.name, backend, runner.into_results());
        report.duration_ms = duration_ms;

        if let Err(e) = teardown {
            error!(suite = %self.name, error = %e, "Suite teardown failed");
            report = report.with_teardown_error(e.to_string());
        }

        info!(
            suite = %self.name,
            passed = report.summary.passed,
            failed = report.summary.failed + report.summary.errors,
            skipped = report.summary.skipped,
            "Suite finished"
        );
        report
    }

    async fn run_one(
        &self,
        runner: &TestRunner,
        case: &TestCase<F::Context>,
        ctx: &F::Context,
    ) -> TestResult {
        let meta = case.meta.clone();

        if runner.should_stop() {
            return TestResult::skipped(meta, "fail-fast: an earlier case failed");
        }
        if !runner.should_run(&meta) {
            return TestResult::skipped(meta, "deselected");
        }

        let timeout = meta.timeout_or(runner.config().default_timeout);
        let result = execute(&meta, case.run, ctx, timeout).await;

        match result.status {
            TestStatus::Passed => {
                info!(case = %meta.full_name, duration_ms = result.duration_ms, "PASSED")
            }
            status => warn!(
                case = %meta.full_name,
                status = %status,
                error = result.error.as_deref().unwrap_or_default(),
                "Case did not pass"
            ),
        }
        result
    }
}

async fn execute<C>(meta: &TestMeta, run: CaseFn<C>, ctx: &C, timeout: Duration) -> TestResult {
    let started = Instant::now();
    let guarded = AssertUnwindSafe(run(ctx)).catch_unwind();
    let outcome = tokio::time::timeout(timeout, guarded).await;
    let duration_ms = started.elapsed().as_millis() as u64;
    let meta = meta.clone();

    match outcome {
        Err(_) => {
            let err = HarnessError::Timeout {
                name: meta.name.clone(),
                timeout,
            };
            TestResult::error(meta, duration_ms, err.to_string())
        }
        Ok(Err(panic)) => {
            TestResult::error(meta, duration_ms, format!("panicked: {}", panic_message(&*panic)))
        }
        Ok(Ok(Err(CaseError::Assertion(e)))) => TestResult::failed(meta, duration_ms, e.to_string()),
        Ok(Ok(Err(e))) => TestResult::error(meta, duration_ms, e.to_string()),
        Ok(Ok(Ok(()))) => TestResult::passed(meta, duration_ms),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
