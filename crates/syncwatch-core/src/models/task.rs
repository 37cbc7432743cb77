use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::constants::TRANSIENT_SUFFIXES;

/// A file discovered by the ingestor, owned by exactly one pipeline run.
#[derive(Debug, Clone)]
pub struct FileTask {
    pub id: Uuid,
    pub path: PathBuf,
    pub discovered_at: DateTime<Utc>,
}

impl FileTask {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            id: Uuid::new_v4(),
            path: path.into(),
            discovered_at: Utc::now(),
        }
    }

    /// Base name used as the ledger key. Bytes that are not valid UTF-8 are
    /// replaced with U+FFFD. `None` only for paths without a file name.
    pub fn filename(&self) -> Option<String> {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
    }
}

/// Whether `name` carries one of the transient download suffixes.
pub fn is_transient_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    TRANSIENT_SUFFIXES
        .iter()
        .any(|suffix| lower.ends_with(suffix))
}

/// Convenience wrapper over [`is_transient_name`] for paths.
pub fn is_transient_path(path: &Path) -> bool {
    path.file_name()
        .map(|n| is_transient_name(&n.to_string_lossy()))
        .unwrap_or(false)
}
