//! Harness configuration
//!
//! Defaults reproduce the fixed layout the harness was built around: the corpus in
//! `examples/` and the parser at `./small_parser.exe`, both relative to the working
//! directory. Every field can be overridden from the command line; there is no config file.

use std::path::PathBuf;
use std::time::Duration;

use super::classification::{FailureTable, UnknownStatusPolicy};
use super::test_interfaces::{DirectoryDiscovery, ProcessExecutor};

pub const DEFAULT_CORPUS_DIR: &str = "examples";
pub const DEFAULT_EXECUTABLE: &str = "./small_parser.exe";

/// Harness configuration
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Directory whose direct entries are the test cases
    pub corpus_dir: PathBuf,
    /// Program invoked once per test case
    pub executable: PathBuf,
    /// Per-invocation limit (`None` waits forever)
    pub timeout: Option<Duration>,
    /// Exit codes that count as failures
    pub failures: FailureTable,
    /// Classification of exit codes missing from `failures`
    pub unknown_status: UnknownStatusPolicy,
    /// Exit non-zero when any test failed
    pub fail_exit: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            corpus_dir: PathBuf::from(DEFAULT_CORPUS_DIR),
            executable: PathBuf::from(DEFAULT_EXECUTABLE),
            timeout: None,
            failures: FailureTable::default(),
            unknown_status: UnknownStatusPolicy::Pass,
            fail_exit: false,
        }
    }
}

impl HarnessConfig {
    /// Create a new config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_corpus_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.corpus_dir = dir.into();
        self
    }

    pub fn with_executable(mut self, executable: impl Into<PathBuf>) -> Self {
        self.executable = executable.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_failures(mut self, failures: FailureTable) -> Self {
        self.failures = failures;
        self
    }

    pub fn with_unknown_status(mut self, policy: UnknownStatusPolicy) -> Self {
        self.unknown_status = policy;
        self
    }

    pub fn with_fail_exit(mut self, fail_exit: bool) -> Self {
        self.fail_exit = fail_exit;
        self
    }

    /// Filesystem discovery rooted at the corpus directory.
    pub fn discovery(&self) -> DirectoryDiscovery {
        DirectoryDiscovery::new(&self.corpus_dir)
    }

    /// Process executor for the configured program.
    pub fn executor(&self) -> ProcessExecutor {
        ProcessExecutor::new(&self.executable).with_timeout(self.timeout)
    }
}
