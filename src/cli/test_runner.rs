//! Harness run loop
//!
//! Every case goes through `invoke -> classify -> report` before the next one starts, in
//! sorted path order. There is no batching and no aggregate summary in the report.
//!
//! ## TestReporter Trait
//!
//! The run loop uses a `TestReporter` trait to separate reporting from execution. The
//! default `ConsoleReporter` writes the line-per-test format to any `io::Write`.

use std::io::{self, Write};
use std::time::{Duration, Instant};

use super::classification::Outcome;
use super::config::HarnessConfig;
use super::test_interfaces::{RunResult, TestCase, TestDiscovery, TestError, TestExecutor, sort_cases};
use super::{CliError, CliResult, ExitCode};

// ============================================================================
// Test Reporter Trait
// ============================================================================

/// Trait for reporting per-test results.
pub trait TestReporter {
    /// Called after each case has been classified
    fn on_test_complete(&mut self, case: &TestCase, run: &RunResult, outcome: &Outcome) -> io::Result<()>;
}

/// Counts for a finished run. Never printed in the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration: Duration,
}

impl RunSummary {
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

/// Render the report lines for one case.
///
/// `PASS <path>` for passes; `FAIL <path>` followed by a tab-indented first line of the
/// captured output for failures.
pub fn format_report(case: &TestCase, run: &RunResult, outcome: &Outcome) -> String {
    let mut text = format!("{} {}\n", outcome.label(), case.display());
    if outcome.is_fail() {
        text.push('\t');
        text.push_str(run.first_line());
        text.push('\n');
    }
    text
}

/// Line-per-test reporter.
pub struct ConsoleReporter<W: Write> {
    out: W,
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> TestReporter for ConsoleReporter<W> {
    fn on_test_complete(&mut self, case: &TestCase, run: &RunResult, outcome: &Outcome) -> io::Result<()> {
        self.out.write_all(format_report(case, run, outcome).as_bytes())?;
        self.out.flush()
    }
}

// ============================================================================
// Run loop
// ============================================================================

/// Discover, invoke, classify and report every case.
///
/// Stops at the first harness-level error (launch failure, report write failure). Test
/// failures never stop the run.
pub fn run_tests(
    config: &HarnessConfig,
    discovery: &dyn TestDiscovery,
    executor: &dyn TestExecutor,
    reporter: &mut dyn TestReporter,
) -> Result<RunSummary, TestError> {
    let start_time = Instant::now();

    let mut cases = discovery.discover();
    // Custom discoveries need not sort; the report order is part of the contract.
    sort_cases(&mut cases);

    tracing::info!(count = cases.len(), "collected test cases");

    let mut passed = 0;
    let mut failed = 0;

    for case in &cases {
        let run = executor.execute(case)?;
        let outcome = config.failures.classify(run.termination, config.unknown_status);
        tracing::debug!(
            case = %case.path.display(),
            termination = %run.termination,
            outcome = outcome.label(),
            reason = outcome.reason(),
            "classified"
        );

        reporter
            .on_test_complete(case, &run, &outcome)
            .map_err(TestError::Report)?;

        match outcome {
            Outcome::Pass => passed += 1,
            Outcome::Fail(_) => failed += 1,
        }
    }

    let summary = RunSummary {
        total: cases.len(),
        passed,
        failed,
        duration: start_time.elapsed(),
    };
    tracing::info!(
        total = summary.total,
        passed = summary.passed,
        failed = summary.failed,
        duration_ms = summary.duration.as_millis() as u64,
        "run complete"
    );

    Ok(summary)
}

/// Run the configured corpus against the configured program, reporting to stdout.
pub fn run_corpus(config: &HarnessConfig) -> CliResult<ExitCode> {
    let discovery = config.discovery();
    let executor = config.executor();
    let mut reporter = ConsoleReporter::new(io::stdout().lock());

    let summary = run_tests(config, &discovery, &executor, &mut reporter)
        .map_err(|e| CliError::failure(format!("{:?}", miette::Report::new(e))))?;

    if config.fail_exit && summary.has_failures() {
        // Report already printed; nothing more to say.
        Err(CliError::new("", ExitCode::FAILURE))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

// ============================================================================
// Tests
// ============================================================================
