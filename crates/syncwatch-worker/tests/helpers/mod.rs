//! Shared fixtures for pipeline integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

use syncwatch_core::{NotificationEvent, PipelineConfig, StaticSettings, UploadOutcome};
use syncwatch_db::LedgerRepository;
use syncwatch_services::{NotificationChannel, NotificationDispatcher, NotifyError, Uploader};
use syncwatch_worker::PipelineCoordinator;

/// Uploader that returns a fixed exit code and remembers what it was asked to send.
pub struct ScriptedUploader {
    exit_code: i32,
    calls: AtomicUsize,
    paths: Mutex<Vec<PathBuf>>,
}

impl ScriptedUploader {
    pub fn exiting_with(exit_code: i32) -> Self {
        Self {
            exit_code,
            calls: AtomicUsize::new(0),
            paths: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.paths.lock().unwrap().clone()
    }
}

#[async_trait]
impl Uploader for ScriptedUploader {
    async fn upload(&self, local_path: &Path, _config: &PipelineConfig) -> UploadOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.paths.lock().unwrap().push(local_path.to_path_buf());
        UploadOutcome::from_exit_code(Some(self.exit_code), Duration::from_millis(25))
    }
}

#[derive(Default)]
pub struct RecordingChannel {
    events: Mutex<Vec<NotificationEvent>>,
}

impl RecordingChannel {
    pub fn events(&self) -> Vec<NotificationEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationChannel for RecordingChannel {
    fn name(&self) -> &str {
        "recording"
    }

    async fn send(&self, event: &NotificationEvent) -> Result<(), NotifyError> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

/// Stands in for an unreachable endpoint; counts attempts.
#[derive(Default)]
pub struct UnreachableChannel {
    attempts: AtomicUsize,
}

impl UnreachableChannel {
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NotificationChannel for UnreachableChannel {
    fn name(&self) -> &str {
        "unreachable"
    }

    async fn send(&self, _event: &NotificationEvent) -> Result<(), NotifyError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(NotifyError::Smtp("Connection refused".into()))
    }
}

pub struct Harness {
    pub root: TempDir,
    /// Keeps the database outside the watched tree.
    pub state: TempDir,
    pub ledger: LedgerRepository,
    pub uploader: Arc<ScriptedUploader>,
    pub recording: Arc<RecordingChannel>,
    pub unreachable: Arc<UnreachableChannel>,
    pub coordinator: Arc<PipelineCoordinator>,
}

impl Harness {
    pub async fn new(config: PipelineConfig, exit_code: i32) -> Self {
        let root = tempfile::tempdir().unwrap();
        let state = tempfile::tempdir().unwrap();
        let pool = syncwatch_db::connect(&state.path().join("uploads.db"), 4)
            .await
            .unwrap();
        let ledger = LedgerRepository::new(pool);

        let uploader = Arc::new(ScriptedUploader::exiting_with(exit_code));
        let recording = Arc::new(RecordingChannel::default());
        let unreachable = Arc::new(UnreachableChannel::default());
        let notifier = NotificationDispatcher::new(Duration::from_secs(2))
            .unwrap()
            .with_channel(unreachable.clone())
            .with_channel(recording.clone());

        let coordinator = Arc::new(PipelineCoordinator::new(
            root.path(),
            Arc::new(StaticSettings(config)),
            ledger.clone(),
            uploader.clone(),
            Arc::new(notifier),
        ));

        Self {
            root,
            state,
            ledger,
            uploader,
            recording,
            unreachable,
            coordinator,
        }
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.path().join(relative)
    }

    /// Run raw SQL against the ledger database over a separate connection.
    pub async fn execute_sql(&self, sql: &str) {
        let pool = syncwatch_db::connect(&self.state.path().join("uploads.db"), 1)
            .await
            .unwrap();
        sqlx::query(sql).execute(&pool).await.unwrap();
        pool.close().await;
    }

    /// Create a file of `size` bytes without writing them out.
    pub fn sparse_file(&self, relative: &str, size: u64) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::File::create(&path).unwrap().set_len(size).unwrap();
        path
    }
}

/// Settings with no stability wait.
pub fn instant_config() -> PipelineConfig {
    PipelineConfig {
        check_duration: 0,
        ..Default::default()
    }
}
