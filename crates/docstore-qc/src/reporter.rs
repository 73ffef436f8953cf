//! Test reporter - renders a run in various formats

use serde::{Deserialize, Serialize};
use std::fmt::Write as FmtWrite;
use thiserror::Error;

use crate::runner::{TestResult, TestStatus, TestSummary};

/// Report output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReportFormat {
    /// Colored terminal output
    #[default]
    Console,
    /// Markdown (human-readable)
    Markdown,
    /// JSON (machine-parseable)
    Json,
    /// YAML
    Yaml,
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportFormat::Console => write!(f, "console"),
            ReportFormat::Markdown => write!(f, "markdown"),
            ReportFormat::Json => write!(f, "json"),
            ReportFormat::Yaml => write!(f, "yaml"),
        }
    }
}

impl std::str::FromStr for ReportFormat {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "console" => Ok(ReportFormat::Console),
            "markdown" | "md" => Ok(ReportFormat::Markdown),
            "json" => Ok(ReportFormat::Json),
            "yaml" | "yml" => Ok(ReportFormat::Yaml),
            other => Err(ReportError::UnknownFormat(other.to_string())),
        }
    }
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("unknown report format '{0}'")]
    UnknownFormat(String),

    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML encoding failed: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("formatting failed")]
    Fmt(#[from] std::fmt::Error),
}

/// Full report of one suite run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestReport {
    pub suite_name: String,
    /// Store backend the suite ran against
    pub backend: String,
    /// Report generation timestamp
    pub generated_at: String,
    /// Total duration in milliseconds
    pub duration_ms: u64,
    pub summary: TestSummary,
    pub results: Vec<TestResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub setup_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teardown_error: Option<String>,
}

impl TestReport {
    pub fn new(
        suite_name: impl Into<String>,
        backend: impl Into<String>,
        results: Vec<TestResult>,
    ) -> Self {
        let summary = TestSummary::from_results(&results);
        Self {
            suite_name: suite_name.into(),
            backend: backend.into(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            duration_ms: summary.total_duration_ms,
            summary,
            results,
            setup_error: None,
            teardown_error: None,
        }
    }

    pub fn with_setup_error(mut self, error: impl Into<String>) -> Self {
        self.setup_error = Some(error.into());
        self
    }

    pub fn with_teardown_error(mut self, error: impl Into<String>) -> Self {
        self.teardown_error = Some(error.into());
        self
    }

    /// Every case passed and both lifecycle hooks succeeded
    pub fn all_passed(&self) -> bool {
        self.setup_error.is_none() && self.teardown_error.is_none() && self.summary.all_passed()
    }

    pub fn failed_results(&self) -> Vec<&TestResult> {
        self.results
            .iter()
            .filter(|r| matches!(r.status, TestStatus::Failed | TestStatus::Error))
            .collect()
    }

    pub fn result(&self, name: &str) -> Option<&TestResult> {
        self.results.iter().find(|r| r.meta.name == name)
    }

    fn date(&self) -> &str {
        self.generated_at.get(..10).unwrap_or(&self.generated_at)
    }
}

/// Report generator
pub struct Reporter {
    format: ReportFormat,
}

impl Reporter {
    pub fn new(format: ReportFormat) -> Self {
        Self { format }
    }

    pub fn console() -> Self {
        Self::new(ReportFormat::Console)
    }

    pub fn markdown() -> Self {
        Self::new(ReportFormat::Markdown)
    }

    pub fn json() -> Self {
        Self::new(ReportFormat::Json)
    }

    pub fn yaml() -> Self {
        Self::new(ReportFormat::Yaml)
    }

    pub fn format(&self) -> ReportFormat {
        self.format
    }

    /// Generate report string
    pub fn generate(&self, report: &TestReport) -> Result<String, ReportError> {
        match self.format {
            ReportFormat::Console => Ok(self.generate_console(report)?),
            ReportFormat::Markdown => Ok(self.generate_markdown(report)?),
            ReportFormat::Json => Ok(serde_json::to_string_pretty(report)?),
            ReportFormat::Yaml => Ok(serde_yaml::to_string(report)?),
        }
    }

    fn generate_markdown(&self, report: &TestReport) -> Result<String, std::fmt::Error> {
        let mut output = String::new();

        writeln!(output, "# Test Report: {}", report.suite_name)?;
        writeln!(output)?;

        let status = if report.all_passed() { "PASSED" } else { "FAILED" };
        writeln!(
            output,
            "**Date**: {} | **Backend**: {} | **Duration**: {:.2}s | **Status**: {} ({}/{})",
            report.date(),
            report.backend,
            report.duration_ms as f64 / 1000.0,
            status,
            report.summary.passed,
            report.summary.total
        )?;
        writeln!(output)?;

        if let Some(ref err) = report.setup_error {
            writeln!(output, "> **Setup failed**: {}", err)?;
            writeln!(output)?;
        }

        writeln!(output, "## Results")?;
        writeln!(output)?;
        writeln!(output, "| # | Case | Status | Duration | Error |")?;
        writeln!(output, "|---|------|--------|----------|-------|")?;
        for (i, result) in report.results.iter().enumerate() {
            writeln!(
                output,
                "| {} | {} | {} | {}ms | {} |",
                i + 1,
                result.meta.name,
                result.status,
                result.duration_ms,
                result.error.as_deref().unwrap_or("").replace('|', "\\|")
            )?;
        }
        writeln!(output)?;

        let failed = report.failed_results();
        if !failed.is_empty() {
            writeln!(output, "## Failures")?;
            writeln!(output)?;
            for result in failed {
                writeln!(output, "### {}", result.meta.full_name)?;
                writeln!(output)?;
                writeln!(output, "```")?;
                writeln!(output, "{}", result.error.as_deref().unwrap_or("no message"))?;
                writeln!(output, "```")?;
                writeln!(output)?;
            }
        }

        if let Some(ref err) = report.teardown_error {
            writeln!(output, "## Teardown")?;
            writeln!(output)?;
            writeln!(output, "{}", err)?;
        }

        Ok(output)
    }

    fn generate_console(&self, report: &TestReport) -> Result<String, std::fmt::Error> {
        let mut output = String::new();

        // ANSI color codes
        const RESET: &str = "\x1b[0m";
        const BOLD: &str = "\x1b[1m";
        const GREEN: &str = "\x1b[32m";
        const RED: &str = "\x1b[31m";
        const YELLOW: &str = "\x1b[33m";
        const DIM: &str = "\x1b[2m";

        let passed = report.all_passed();
        let status_color = if passed { GREEN } else { RED };
        let status_text = if passed { "PASSED" } else { "FAILED" };

        writeln!(
            output,
            "\n{}{}=== Test Report: {} ({}) ==={}",
            BOLD, status_color, report.suite_name, report.backend, RESET
        )?;
        writeln!(
            output,
            "{}Status: {}{}{}  |  Duration: {:.2}s  |  Date: {}{}",
            DIM,
            status_color,
            status_text,
            DIM,
            report.duration_ms as f64 / 1000.0,
            report.date(),
            RESET
        )?;
        writeln!(output)?;

        if let Some(ref err) = report.setup_error {
            writeln!(output, "  {}SETUP ERROR{} {}", RED, RESET, err)?;
        }

        for result in &report.results {
            let (color, label) = match result.status {
                TestStatus::Passed => (GREEN, "PASS"),
                TestStatus::Failed => (RED, "FAIL"),
                TestStatus::Error => (RED, "ERR "),
                TestStatus::Skipped => (YELLOW, "SKIP"),
            };
            write!(
                output,
                "  {}{}{} {} {}({}ms){}",
                color, label, RESET, result.meta.name, DIM, result.duration_ms, RESET
            )?;
            match (&result.status, &result.error) {
                (TestStatus::Passed, _) | (_, None) => writeln!(output)?,
                (_, Some(err)) => writeln!(output, "\n       {}{}{}", DIM, err, RESET)?,
            }
        }

        if let Some(ref err) = report.teardown_error {
            writeln!(output, "  {}TEARDOWN ERROR{} {}", RED, RESET, err)?;
        }

        writeln!(output)?;
        writeln!(
            output,
            "{}{} passed{}, {}{} failed{}, {} errors, {}{} skipped{} of {}",
            GREEN,
            report.summary.passed,
            RESET,
            RED,
            report.summary.failed,
            RESET,
            report.summary.errors,
            YELLOW,
            report.summary.skipped,
            RESET,
            report.summary.total
        )?;

        Ok(output)
    }
}
