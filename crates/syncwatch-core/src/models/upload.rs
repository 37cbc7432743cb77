use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use std::time::Duration;

/// Outcome of one upload attempt as stored in the ledger.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum UploadStatus {
    Success,
    Failed,
}

impl UploadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadStatus::Success => "success",
            UploadStatus::Failed => "failed",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, UploadStatus::Success)
    }
}

impl Display for UploadStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for UploadStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(UploadStatus::Success),
            "failed" => Ok(UploadStatus::Failed),
            _ => Err(anyhow::anyhow!("Invalid upload status: {}", s)),
        }
    }
}

/// One row of upload history, unique on `(filename, size)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadRecord {
    /// Base name only, never a path.
    pub filename: String,
    pub size: i64,
    pub upload_time: DateTime<Utc>,
    pub status: UploadStatus,
}

/// Why an attempt ended up `Failed`.
///
/// `Exited` means the tool ran and reported failure; the other variants mean
/// the tool could not be driven to completion at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureKind {
    Exited { code: i32 },
    /// Killed by a signal, no exit code available.
    Terminated,
    SpawnFailed { reason: String },
    TimedOut { after_secs: u64 },
}

impl FailureKind {
    /// True when the sync tool never produced a verdict of its own.
    pub fn is_unreachable(&self) -> bool {
        matches!(
            self,
            FailureKind::SpawnFailed { .. } | FailureKind::TimedOut { .. }
        )
    }
}

impl Display for FailureKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            FailureKind::Exited { code } => write!(f, "sync tool exited with code {}", code),
            FailureKind::Terminated => write!(f, "sync tool was terminated by a signal"),
            FailureKind::SpawnFailed { reason } => {
                write!(f, "sync tool could not be started: {}", reason)
            }
            FailureKind::TimedOut { after_secs } => {
                write!(f, "sync tool timed out after {}s", after_secs)
            }
        }
    }
}

/// Result of a single invocation of the sync tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    pub status: UploadStatus,
    pub elapsed: Duration,
    /// Present iff `status` is `Failed`.
    pub failure: Option<FailureKind>,
}

impl UploadOutcome {
    pub fn success(elapsed: Duration) -> Self {
        Self {
            status: UploadStatus::Success,
            elapsed,
            failure: None,
        }
    }

    pub fn failed(elapsed: Duration, failure: FailureKind) -> Self {
        Self {
            status: UploadStatus::Failed,
            elapsed,
            failure: Some(failure),
        }
    }

    /// Maps a process exit code (None when killed by a signal).
    pub fn from_exit_code(code: Option<i32>, elapsed: Duration) -> Self {
        match code {
            Some(0) => Self::success(elapsed),
            Some(code) => Self::failed(elapsed, FailureKind::Exited { code }),
            None => Self::failed(elapsed, FailureKind::Terminated),
        }
    }
}
