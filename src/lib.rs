#![forbid(unsafe_code)]
//! Exit-status conformance harness
//!
//! `conform` runs an external program once per entry of a test corpus directory, classifies
//! each run as PASS or FAIL from the program's exit status alone, and prints one line per
//! test (plus the first line of the program's output for failures).
//!
//! ## Panic Policy
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` module enforces
//!   `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.

pub mod cli;
pub mod version;

pub use cli::classification::{FailureTable, Outcome, Termination, UnknownStatusPolicy};
pub use cli::config::HarnessConfig;
pub use cli::test_interfaces::{
    DirectoryDiscovery, ProcessExecutor, RunResult, TestCase, TestDiscovery, TestError, TestExecutor,
};
pub use cli::test_runner::{ConsoleReporter, RunSummary, TestReporter, run_tests};
