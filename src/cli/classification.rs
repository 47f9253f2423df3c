//! Outcome classification
//!
//! Decides PASS or FAIL for a finished run using only how the invoked program terminated.
//! The captured output never takes part in the decision.
//!
//! Exit codes listed in the [`FailureTable`] are failures with the listed reason. Codes that
//! are not listed fall through to the [`UnknownStatusPolicy`], which passes them by default.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use clap::ValueEnum;

/// Exit status the program under test reserves for "parsing failed".
pub const PARSE_FAILED_STATUS: i32 = 2;
pub const PARSE_FAILED_REASON: &str = "Parsing failed";

/// How an invoked program ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Normal exit with a status code
    Exited(i32),
    /// Ended without a status code (killed by a signal)
    Signaled,
    /// Killed by the harness after the configured limit elapsed
    TimedOut(Duration),
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::Exited(code) => write!(f, "exit status {}", code),
            Termination::Signaled => write!(f, "signal"),
            Termination::TimedOut(limit) => write!(f, "timeout after {}s", limit.as_secs()),
        }
    }
}

/// Result of classifying one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Pass,
    Fail(String),
}

impl Outcome {
    pub fn is_fail(&self) -> bool {
        matches!(self, Outcome::Fail(_))
    }

    /// Report keyword for this outcome (`PASS` / `FAIL`).
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Pass => "PASS",
            Outcome::Fail(_) => "FAIL",
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Outcome::Pass => None,
            Outcome::Fail(reason) => Some(reason),
        }
    }
}

/// What to do with exit codes that are not in the failure table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum UnknownStatusPolicy {
    /// Unlisted codes pass (only known failure codes fail)
    #[default]
    Pass,
    /// Unlisted non-zero codes and signal deaths fail
    Fail,
}

/// Immutable mapping from exit status to failure reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureTable {
    reasons: BTreeMap<i32, String>,
}

impl Default for FailureTable {
    fn default() -> Self {
        Self::empty().with_reason(PARSE_FAILED_STATUS, PARSE_FAILED_REASON)
    }
}

impl FailureTable {
    /// A table with no known failure codes; every exit is decided by the policy.
    pub fn empty() -> Self {
        Self {
            reasons: BTreeMap::new(),
        }
    }

    /// Add (or replace) the reason for an exit status.
    pub fn with_reason(mut self, status: i32, reason: impl Into<String>) -> Self {
        self.reasons.insert(status, reason.into());
        self
    }

    pub fn reason(&self, status: i32) -> Option<&str> {
        self.reasons.get(&status).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.reasons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reasons.is_empty()
    }

    /// Classify a termination. Total over every possible termination.
    pub fn classify(&self, termination: Termination, policy: UnknownStatusPolicy) -> Outcome {
        match termination {
            Termination::Exited(status) => match (self.reason(status), policy) {
                (Some(reason), _) => Outcome::Fail(reason.to_string()),
                (None, UnknownStatusPolicy::Pass) => Outcome::Pass,
                (None, UnknownStatusPolicy::Fail) if status == 0 => Outcome::Pass,
                (None, UnknownStatusPolicy::Fail) => Outcome::Fail(format!("Exited with status {}", status)),
            },
            Termination::Signaled => match policy {
                UnknownStatusPolicy::Pass => Outcome::Pass,
                UnknownStatusPolicy::Fail => Outcome::Fail("Terminated by signal".to_string()),
            },
            Termination::TimedOut(limit) => Outcome::Fail(format!("Timed out after {}s", limit.as_secs())),
        }
    }
}
