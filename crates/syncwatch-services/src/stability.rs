//! Size-sampling quiescence check
//!
//! Sample the size, wait once, sample again. Equal sizes mean the writer is
//! done as far as we can tell. A file that pauses for exactly the window and
//! then resumes is misjudged as stable; that is accepted for completed
//! downloads. No shared state is touched during the wait.

use std::path::Path;
use std::time::Duration;
use tokio::fs;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stability {
    Stable { size: u64 },
    Changing { before: u64, after: u64 },
    /// Missing, not a regular file, or metadata could not be read at either sample.
    Unreadable,
}

impl Stability {
    pub fn is_stable(&self) -> bool {
        matches!(self, Stability::Stable { .. })
    }
}

async fn sample(path: &Path) -> Option<u64> {
    match fs::metadata(path).await {
        Ok(meta) if meta.is_file() => Some(meta.len()),
        Ok(_) => None,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "Size sample failed");
            None
        }
    }
}

/// Never errors: any I/O failure is reported as [`Stability::Unreadable`].
pub async fn check_stability(path: &Path, window: Duration) -> Stability {
    let Some(before) = sample(path).await else {
        return Stability::Unreadable;
    };

    tokio::time::sleep(window).await;

    match sample(path).await {
        Some(after) if after == before => Stability::Stable { size: after },
        Some(after) => Stability::Changing { before, after },
        None => Stability::Unreadable,
    }
}

pub async fn is_stable(path: &Path, window: Duration) -> bool {
    check_stability(path, window).await.is_stable()
}
