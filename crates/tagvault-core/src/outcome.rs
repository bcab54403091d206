//! Outcome values for coordinated operations.
//!
//! Per-profile and per-target errors never cross the coordinator boundary as
//! `Err`. They are recorded here and the caller decides what to surface.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::ports::EndpointError;

/// Why a single attempt against one profile or target failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AttemptError {
    /// The profile or target could not be reached.
    #[error("connectivity error: {0}")]
    Connectivity(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// A read returned no rows where at least one was required.
    #[error("query returned no rows")]
    EmptyResult,

    /// The row mapper rejected the result.
    #[error("row mapping failed: {0}")]
    Mapping(String),

    /// The endpoint was reachable but the statement failed.
    #[error("statement failed: {0}")]
    Statement(String),

    #[error("I/O error: {0}")]
    Io(String),

    /// The round was cancelled before this attempt started.
    #[error("cancelled")]
    Cancelled,

    /// The attempt task panicked or was aborted.
    #[error("attempt aborted: {0}")]
    Aborted(String),
}

impl AttemptError {
    /// Connectivity-class failures: the store was down, not the request wrong.
    pub const fn is_connectivity(&self) -> bool {
        matches!(self, Self::Connectivity(_) | Self::Timeout(_))
    }
}

impl From<EndpointError> for AttemptError {
    fn from(err: EndpointError) -> Self {
        match err {
            EndpointError::Unreachable(msg) => Self::Connectivity(msg),
            EndpointError::Statement(msg) => Self::Statement(msg),
        }
    }
}

impl From<std::io::Error> for AttemptError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Aggregate status of an attempt-all round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    /// Every attempt succeeded.
    Complete,
    /// Some but not all attempts succeeded. Still a success overall.
    Partial,
    /// Nothing succeeded.
    TotalFailure,
}

impl OutcomeStatus {
    const fn from_counts(succeeded: usize, failed: usize) -> Self {
        match (succeeded, failed) {
            (0, _) => Self::TotalFailure,
            (_, 0) => Self::Complete,
            _ => Self::Partial,
        }
    }
}

/// A failure recorded against one named profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileFailure {
    pub profile: String,
    pub error: AttemptError,
}

impl fmt::Display for ProfileFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.profile, self.error)
    }
}

fn join_failures<T: fmt::Display>(failures: &[T]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result of a race read.
#[derive(Debug, Clone)]
pub struct ReadOutcome<T> {
    /// The accepted value, present only on success.
    pub value: Option<T>,
    /// Name of the profile whose result was accepted.
    pub source_profile: Option<String>,
    /// Aggregated description of every loss, present only on total failure.
    pub error_detail: Option<String>,
    /// Individual losses observed before the winner (or all of them).
    pub failures: Vec<ProfileFailure>,
}

impl<T> ReadOutcome<T> {
    pub(crate) fn won(value: T, source_profile: String, failures: Vec<ProfileFailure>) -> Self {
        Self {
            value: Some(value),
            source_profile: Some(source_profile),
            error_detail: None,
            failures,
        }
    }

    pub(crate) fn lost(failures: Vec<ProfileFailure>) -> Self {
        let detail = if failures.is_empty() {
            "no profile produced a result".to_string()
        } else {
            join_failures(&failures)
        };
        Self {
            value: None,
            source_profile: None,
            error_detail: Some(detail),
            failures,
        }
    }

    pub const fn succeeded(&self) -> bool {
        self.value.is_some()
    }

    /// Consume the outcome, keeping only the value.
    pub fn into_value(self) -> Option<T> {
        self.value
    }
}

/// Result of a fan-out or self-healing write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteOutcome {
    pub success_count: usize,
    /// Failures in profile configuration order.
    pub failures: Vec<ProfileFailure>,
}

impl WriteOutcome {
    pub const fn any_succeeded(&self) -> bool {
        self.success_count > 0
    }

    pub fn attempted(&self) -> usize {
        self.success_count + self.failures.len()
    }

    pub fn status(&self) -> OutcomeStatus {
        OutcomeStatus::from_counts(self.success_count, self.failures.len())
    }

    pub fn error_detail(&self) -> Option<String> {
        (!self.failures.is_empty()).then(|| join_failures(&self.failures))
    }
}

/// A failure recorded against one target path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedPath {
    pub path: PathBuf,
    pub error: AttemptError,
}

impl fmt::Display for FailedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.error)
    }
}

/// Result of a replicated file operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileOpOutcome {
    pub successful_paths: BTreeSet<PathBuf>,
    /// Failures in target configuration order.
    pub failed_paths: Vec<FailedPath>,
    /// Path on the first accessible target, whether or not it succeeded.
    pub primary_path: Option<PathBuf>,
}

impl FileOpOutcome {
    pub fn success_count(&self) -> usize {
        self.successful_paths.len()
    }

    pub fn attempted(&self) -> usize {
        self.successful_paths.len() + self.failed_paths.len()
    }

    pub fn any_succeeded(&self) -> bool {
        !self.successful_paths.is_empty()
    }

    pub fn status(&self) -> OutcomeStatus {
        OutcomeStatus::from_counts(self.successful_paths.len(), self.failed_paths.len())
    }

    pub fn error_detail(&self) -> Option<String> {
        (!self.failed_paths.is_empty()).then(|| join_failures(&self.failed_paths))
    }
}

/// Result of a missing-copy repair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairOutcome {
    /// Repaired copies in `successful_paths`; unreachable targets or failed
    /// copies in `failed_paths`.
    pub files: FileOpOutcome,
    /// Targets that already held the file and were left untouched.
    pub already_present: Vec<PathBuf>,
}

impl RepairOutcome {
    pub fn repaired(&self) -> usize {
        self.files.success_count()
    }
}
