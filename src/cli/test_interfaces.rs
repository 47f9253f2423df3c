//! Harness I/O boundary interfaces
//!
//! This module defines trait-based abstractions for the two operations that touch the
//! outside world:
//! - Test discovery (listing the corpus directory)
//! - Test execution (spawning the program under test and capturing its result)
//!
//! The runner only talks to these traits, so its loop can be exercised with in-memory
//! fakes. Default implementations read the filesystem and spawn real processes.

use std::ffi::OsStr;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, mpsc};
use std::thread;
use std::time::{Duration, Instant};

use miette::Diagnostic;
use thiserror::Error;

use super::classification::Termination;

/// How often a child is polled while a timeout is configured.
const POLL_INTERVAL: Duration = Duration::from_millis(10);
/// Minimum time to wait for stdout to drain once the child has ended.
const DRAIN_GRACE: Duration = Duration::from_millis(200);

/// Errors that abort a harness run.
///
/// A test that fails is never an error; these are environment-level problems.
#[derive(Debug, Error, Diagnostic)]
pub enum TestError {
    #[error("failed to launch `{}` for {case}: {source}", .executable.display())]
    #[diagnostic(
        code(conform::launch),
        help("the executable path is resolved relative to the current directory; pass --executable to change it")
    )]
    Launch {
        executable: PathBuf,
        case: String,
        source: io::Error,
    },

    #[error("failed to wait for `{}` on {case}: {source}", .executable.display())]
    #[diagnostic(code(conform::wait))]
    Wait {
        executable: PathBuf,
        case: String,
        source: io::Error,
    },

    #[error("failed to write report: {0}")]
    #[diagnostic(code(conform::report))]
    Report(#[source] io::Error),
}

// ============================================================================
// Data types
// ============================================================================

/// One entry of the test corpus, identified by its path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    pub path: PathBuf,
}

impl TestCase {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path as shown in the report.
    pub fn display(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }
}

/// Sort cases lexicographically by their path string.
pub fn sort_cases(cases: &mut [TestCase]) {
    cases.sort_by(|a, b| a.path.as_os_str().cmp(b.path.as_os_str()));
}

/// Captured result of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    pub stdout: String,
    pub termination: Termination,
}

impl RunResult {
    pub fn new(stdout: impl Into<String>, termination: Termination) -> Self {
        Self {
            stdout: stdout.into(),
            termination,
        }
    }

    /// First line of stdout without its terminator, or `""` when there was no output.
    pub fn first_line(&self) -> &str {
        self.stdout.lines().next().unwrap_or("")
    }
}

// ============================================================================
// Test Discovery Interface
// ============================================================================

/// Enumerate test cases.
pub trait TestDiscovery {
    /// Return every test case. A missing or empty corpus yields an empty list.
    fn discover(&self) -> Vec<TestCase>;
}

/// Lists the direct entries of a corpus directory (files and subdirectories alike).
#[derive(Debug, Clone)]
pub struct DirectoryDiscovery {
    root: PathBuf,
}

impl DirectoryDiscovery {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl TestDiscovery for DirectoryDiscovery {
    #[tracing::instrument(skip_all, fields(root = %self.root.display()))]
    fn discover(&self) -> Vec<TestCase> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) => {
                if e.kind() != io::ErrorKind::NotFound {
                    tracing::warn!(error = %e, "corpus directory is unreadable, treating it as empty");
                }
                return Vec::new();
            }
        };

        let mut cases = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable corpus entry");
                    continue;
                }
            };
            if is_hidden(&entry.file_name()) {
                continue;
            }
            cases.push(TestCase::new(self.root.join(entry.file_name())));
        }

        sort_cases(&mut cases);
        cases
    }
}

fn is_hidden(name: &OsStr) -> bool {
    name.as_encoded_bytes().first() == Some(&b'.')
}

// ============================================================================
// Test Executor Interface
// ============================================================================

/// Run the program under test against one case.
pub trait TestExecutor {
    fn execute(&self, case: &TestCase) -> Result<RunResult, TestError>;
}

/// Spawns the executable with the case path as its only argument.
///
/// stdin is null, stderr is inherited, stdout is captured.
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    executable: PathBuf,
    timeout: Option<Duration>,
}

impl ProcessExecutor {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            timeout: None,
        }
    }

    /// Bound each invocation; `None` waits forever.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    fn command(&self, case: &TestCase) -> Command {
        let mut command = Command::new(&self.executable);
        command
            .arg(&case.path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());
        command
    }

    fn launch_error(&self, case: &TestCase, source: io::Error) -> TestError {
        TestError::Launch {
            executable: self.executable.clone(),
            case: case.display(),
            source,
        }
    }

    fn wait_error(&self, case: &TestCase, source: io::Error) -> TestError {
        TestError::Wait {
            executable: self.executable.clone(),
            case: case.display(),
            source,
        }
    }

    fn run_to_completion(&self, case: &TestCase) -> Result<RunResult, TestError> {
        let output = self.command(case).output().map_err(|e| self.launch_error(case, e))?;
        Ok(RunResult::new(
            String::from_utf8_lossy(&output.stdout),
            termination_of(output.status),
        ))
    }

    fn run_with_timeout(&self, case: &TestCase, limit: Duration) -> Result<RunResult, TestError> {
        let mut child = self.command(case).spawn().map_err(|e| self.launch_error(case, e))?;
        let started = Instant::now();

        // Drain stdout on a side thread so a chatty child can't stall on a full pipe. Bytes land
        // in the shared buffer as they arrive; `done` fires at EOF.
        let captured = Arc::new(Mutex::new(Vec::new()));
        let (done_tx, done_rx) = mpsc::channel();
        match child.stdout.take() {
            Some(stdout) => {
                let sink = Arc::clone(&captured);
                thread::spawn(move || {
                    drain_into(stdout, &sink);
                    let _ = done_tx.send(());
                });
            }
            None => drop(done_tx),
        }

        let termination = loop {
            match child.try_wait() {
                Ok(Some(status)) => break termination_of(status),
                Ok(None) if started.elapsed() >= limit => {
                    tracing::debug!(limit_secs = limit.as_secs(), "killing timed-out child");
                    let _ = child.kill();
                    child.wait().map_err(|e| self.wait_error(case, e))?;
                    break Termination::TimedOut(limit);
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => return Err(self.wait_error(case, e)),
            }
        };

        // Grandchildren may keep the pipe open after the child is gone; the drain shares the
        // invocation deadline and gives up with whatever has arrived so far.
        let drain_budget = limit.saturating_sub(started.elapsed()).max(DRAIN_GRACE);
        if done_rx.recv_timeout(drain_budget).is_err() {
            tracing::debug!("stdout still open after child exit, using partial output");
        }

        let stdout = lock_buffer(&captured).clone();
        Ok(RunResult::new(String::from_utf8_lossy(&stdout), termination))
    }
}

fn drain_into(mut stdout: impl Read, sink: &Mutex<Vec<u8>>) {
    let mut chunk = [0u8; 4096];
    loop {
        match stdout.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => lock_buffer(sink).extend_from_slice(&chunk[..n]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(_) => break,
        }
    }
}

fn lock_buffer(buffer: &Mutex<Vec<u8>>) -> MutexGuard<'_, Vec<u8>> {
    buffer.lock().unwrap_or_else(PoisonError::into_inner)
}

impl TestExecutor for ProcessExecutor {
    #[tracing::instrument(skip_all, fields(case = %case.path.display()))]
    fn execute(&self, case: &TestCase) -> Result<RunResult, TestError> {
        let result = match self.timeout {
            Some(limit) => self.run_with_timeout(case, limit),
            None => self.run_to_completion(case),
        }?;
        tracing::debug!(termination = %result.termination, stdout_len = result.stdout.len(), "invocation finished");
        Ok(result)
    }
}

fn termination_of(status: ExitStatus) -> Termination {
    status.code().map_or(Termination::Signaled, Termination::Exited)
}

// ============================================================================
// Tests
// ============================================================================
