//! Pipeline coordinator
//!
//! One [`PipelineCoordinator::run`] call takes a [`FileTask`] through
//! filter, stability, dedup, upload, record, cleanup and notify, in that
//! order, ending at the first terminal state. Nothing is retried within a run.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;

use syncwatch_core::{
    is_transient_name, AppError, FileTask, NotificationEvent, SettingsProvider, UploadStatus,
};
use syncwatch_db::LedgerRepository;
use syncwatch_services::{check_stability, NotificationDispatcher, Stability, Uploader};

use crate::context::TaskHandler;

/// Terminal state a run ended in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Transient download name, or a path with no file name.
    Filtered,
    /// Size changed between the two samples.
    Unstable,
    /// Vanished or unreadable while sampling.
    Unreadable,
    /// A `Success` row already exists for this name and size.
    Duplicate { deleted: bool },
    Uploaded {
        status: UploadStatus,
        cleaned_up: bool,
    },
}

pub struct PipelineCoordinator {
    watch_root: PathBuf,
    settings: Arc<dyn SettingsProvider>,
    ledger: LedgerRepository,
    uploader: Arc<dyn Uploader>,
    notifier: Arc<NotificationDispatcher>,
}

impl PipelineCoordinator {
    pub fn new(
        watch_root: impl Into<PathBuf>,
        settings: Arc<dyn SettingsProvider>,
        ledger: LedgerRepository,
        uploader: Arc<dyn Uploader>,
        notifier: Arc<NotificationDispatcher>,
    ) -> Self {
        Self {
            watch_root: watch_root.into(),
            settings,
            ledger,
            uploader,
            notifier,
        }
    }

    pub fn watch_root(&self) -> &Path {
        &self.watch_root
    }

    /// Only a ledger failure is an error; every other ending is a [`RunOutcome`].
    #[tracing::instrument(skip(self, task), fields(task_id = %task.id, path = %task.path.display()))]
    pub async fn run(&self, task: FileTask) -> Result<RunOutcome, AppError> {
        let Some(filename) = task.filename() else {
            tracing::warn!("Path has no file name, skipping");
            return Ok(RunOutcome::Filtered);
        };
        if is_transient_name(&filename) {
            tracing::debug!(file = %filename, "Transient download file, skipping");
            return Ok(RunOutcome::Filtered);
        }

        let config = self.settings.snapshot().await;

        tracing::info!(file = %filename, window_secs = config.check_duration, "Checking stability");
        let size = match check_stability(&task.path, config.check_duration()).await {
            Stability::Stable { size } => size,
            Stability::Changing { before, after } => {
                tracing::info!(file = %filename, before, after, "File still being written");
                return Ok(RunOutcome::Unstable);
            }
            Stability::Unreadable => {
                tracing::info!(file = %filename, "File vanished or unreadable");
                return Ok(RunOutcome::Unreadable);
            }
        };
        let size = i64::try_from(size).map_err(|_| {
            AppError::InvalidInput(format!("File too large to record: {} bytes", size))
        })?;

        if config.prevent_reupload {
            if let Some(UploadStatus::Success) = self.ledger.lookup(&filename, size).await? {
                tracing::info!(file = %filename, size, "Already uploaded, skipping");
                let deleted = config.auto_delete && self.remove_local(&task.path).await;
                return Ok(RunOutcome::Duplicate { deleted });
            }
        }

        tracing::info!(file = %filename, size, remote = %config.remote_target, "Upload started");
        let outcome = self.uploader.upload(&task.path, &config).await;

        let recorded = match self
            .ledger
            .record(&filename, size, Utc::now(), outcome.status)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(file = %filename, error = %e, "Failed to record upload outcome");
                false
            }
        };

        match outcome.failure {
            None => tracing::info!(
                file = %filename,
                elapsed_secs = outcome.elapsed.as_secs_f64(),
                "Upload complete"
            ),
            Some(ref failure) => tracing::error!(
                file = %filename,
                failure = %failure,
                unreachable = failure.is_unreachable(),
                "Upload failed"
            ),
        }

        // Without a ledger row the local copy is the only trace, so keep it.
        let cleaned_up = outcome.status.is_success()
            && config.auto_delete
            && recorded
            && self.remove_local(&task.path).await;

        let event = NotificationEvent {
            status: outcome.status,
            filename,
            size,
            elapsed: outcome.elapsed,
            failure: outcome.failure,
        };
        self.notifier.dispatch(&event, &config).await;

        Ok(RunOutcome::Uploaded {
            status: outcome.status,
            cleaned_up,
        })
    }

    /// Delete the file, then its parent if now empty. Returns whether the file
    /// itself was removed; directory removal is best-effort.
    async fn remove_local(&self, path: &Path) -> bool {
        if let Err(e) = fs::remove_file(path).await {
            tracing::warn!(path = %path.display(), error = %e, "Failed to delete local file");
            return false;
        }
        tracing::info!(path = %path.display(), "Local file deleted");

        if let Some(parent) = path.parent() {
            if self.is_removable_dir(parent).await {
                // remove_dir refuses non-empty directories, which covers a file landing meanwhile.
                match fs::remove_dir(parent).await {
                    Ok(()) => tracing::info!(dir = %parent.display(), "Empty directory removed"),
                    Err(e) => {
                        tracing::debug!(dir = %parent.display(), error = %e, "Directory left in place")
                    }
                }
            }
        }
        true
    }

    /// Strictly below the watch root. The root itself and anything outside it
    /// are never removed.
    async fn is_removable_dir(&self, dir: &Path) -> bool {
        let (dir, root) = match (
            fs::canonicalize(dir).await,
            fs::canonicalize(&self.watch_root).await,
        ) {
            (Ok(dir), Ok(root)) => (dir, root),
            _ => return false,
        };
        dir != root && dir.starts_with(&root)
    }
}

#[async_trait]
impl TaskHandler for PipelineCoordinator {
    async fn handle(&self, task: FileTask) -> Result<()> {
        let outcome = self.run(task).await?;
        tracing::debug!(?outcome, "Pipeline run finished");
        Ok(())
    }
}
