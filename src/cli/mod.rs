//! CLI module for the conformance harness
//!
//! This module provides the command-line interface for the harness.
//!
//! ## Modules
//!
//! - `classification` - Exit status -> PASS/FAIL mapping
//! - `config` - Harness settings and their defaults
//! - `test_interfaces` - Discovery and process execution boundaries
//! - `test_runner` - Run loop and reporting
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod classification;
pub mod config;
pub mod test_interfaces;
pub mod test_runner;

use std::fmt;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::Parser;

use crate::version::CONFORM_VERSION;
use classification::{FailureTable, UnknownStatusPolicy};
use config::{DEFAULT_CORPUS_DIR, DEFAULT_EXECUTABLE, HarnessConfig};

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    /// Create a new CLI error with a message and exit code.
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Run an external parser over a test corpus and report PASS/FAIL per entry
#[derive(Parser, Debug)]
#[command(name = "conform")]
#[command(version = CONFORM_VERSION)]
#[command(about = "Run an external parser over a test corpus and report PASS/FAIL per entry", long_about = None)]
pub struct Cli {
    /// Directory whose entries are the test cases
    #[arg(long, value_name = "DIR", default_value = DEFAULT_CORPUS_DIR)]
    pub corpus: PathBuf,

    /// Program invoked with each test case path as its only argument
    #[arg(long, value_name = "PATH", default_value = DEFAULT_EXECUTABLE)]
    pub executable: PathBuf,

    /// Kill an invocation after this many seconds and report it as FAIL
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// How to classify exit statuses that are not known failure codes
    #[arg(long, value_enum, value_name = "POLICY", default_value_t = UnknownStatusPolicy::Pass)]
    pub unknown_status: UnknownStatusPolicy,

    /// Extra failure code, e.g. `--failure 3="Lexing failed"` (repeatable)
    #[arg(long = "failure", value_name = "CODE=REASON", value_parser = parse_failure_entry)]
    pub failures: Vec<(i32, String)>,

    /// Exit with status 1 when any test fails
    #[arg(long)]
    pub fail_exit: bool,
}

impl Cli {
    /// Build the harness configuration from parsed flags.
    pub fn into_config(self) -> HarnessConfig {
        let failures = self
            .failures
            .into_iter()
            .fold(FailureTable::default(), |table, (code, reason)| table.with_reason(code, reason));

        HarnessConfig::new()
            .with_corpus_dir(self.corpus)
            .with_executable(self.executable)
            .with_timeout(self.timeout.map(Duration::from_secs))
            .with_failures(failures)
            .with_unknown_status(self.unknown_status)
            .with_fail_exit(self.fail_exit)
    }
}

fn parse_failure_entry(raw: &str) -> Result<(i32, String), String> {
    let (code, reason) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected CODE=REASON, got `{}`", raw))?;
    let code = code
        .trim()
        .parse::<i32>()
        .map_err(|e| format!("invalid exit code `{}`: {}", code.trim(), e))?;
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(format!("missing reason for exit code {}", code));
    }
    Ok((code, reason.to_string()))
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the parsed command line and return result.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    let config = cli.into_config();
    tracing::info!(
        corpus = %config.corpus_dir.display(),
        executable = %config.executable.display(),
        timeout_secs = config.timeout.map(|t| t.as_secs()),
        "starting harness"
    );
    test_runner::run_corpus(&config)
}

// ============================================================================
// Tests
// ============================================================================
