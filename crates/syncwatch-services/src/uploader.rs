//! Sync tool invocation
//!
//! One attempt per call, no retry. The exit code is the only control-flow
//! signal; the tool's own log goes to an append-mode file and captured stderr
//! is only used for operator logs.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;

use syncwatch_core::{FailureKind, PipelineConfig, UploadOutcome};

/// Longest stderr tail kept in logs.
const STDERR_TAIL_BYTES: usize = 2048;

/// How long to wait for the stderr reader once the tool has exited.
const STDERR_DRAIN: Duration = Duration::from_secs(1);

#[async_trait]
pub trait Uploader: Send + Sync {
    /// Blocks the calling task until the transfer terminates. Never errors:
    /// every way of not succeeding is a `Failed` outcome with a [`FailureKind`].
    async fn upload(&self, local_path: &Path, config: &PipelineConfig) -> UploadOutcome;
}

#[derive(Debug, Clone)]
pub struct RcloneConfig {
    pub binary: String,
    pub log_file: PathBuf,
    pub log_level: String,
    /// Passed as `--config` when set.
    pub config_path: Option<PathBuf>,
    pub timeout: Duration,
}

pub struct RcloneUploader {
    config: RcloneConfig,
}

impl RcloneUploader {
    pub fn new(config: RcloneConfig) -> Self {
        Self { config }
    }

    /// `copy <src> <remote> --buffer-size .. --transfers .. --checkers .. --log-file .. --log-level ..`
    pub fn args(&self, local_path: &Path, pipeline: &PipelineConfig) -> Vec<String> {
        let tuning = &pipeline.transfer_tuning;
        let mut args = vec![
            "copy".to_string(),
            local_path.to_string_lossy().into_owned(),
            pipeline.remote_target.clone(),
            "--buffer-size".to_string(),
            tuning.buffer_size.clone(),
            "--transfers".to_string(),
            tuning.transfers.clone(),
            "--checkers".to_string(),
            tuning.checkers.clone(),
            "--log-file".to_string(),
            self.config.log_file.to_string_lossy().into_owned(),
            "--log-level".to_string(),
            self.config.log_level.clone(),
        ];
        if let Some(ref config_path) = self.config.config_path {
            args.push("--config".to_string());
            args.push(config_path.to_string_lossy().into_owned());
        }
        args
    }

    fn command(&self, local_path: &Path, pipeline: &PipelineConfig) -> Command {
        let mut cmd = Command::new(&self.config.binary);
        cmd.args(self.args(local_path, pipeline))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

/// Drain `reader`, keeping only the last [`STDERR_TAIL_BYTES`] bytes.
async fn read_tail<R: AsyncRead + Unpin>(mut reader: R) -> Vec<u8> {
    let mut tail = VecDeque::with_capacity(STDERR_TAIL_BYTES);
    let mut buf = [0u8; 4096];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                tail.extend(&buf[..n]);
                let excess = tail.len().saturating_sub(STDERR_TAIL_BYTES);
                tail.drain(..excess);
            }
        }
    }
    tail.into()
}

async fn stderr_tail(reader: Option<JoinHandle<Vec<u8>>>) -> String {
    let Some(reader) = reader else {
        return String::new();
    };
    match tokio::time::timeout(STDERR_DRAIN, reader).await {
        Ok(Ok(bytes)) => String::from_utf8_lossy(&bytes).trim().to_string(),
        _ => String::new(),
    }
}

/// Whole seconds, rounded up so a sub-second timeout never reports 0.
fn ceil_secs(duration: Duration) -> u64 {
    duration.as_secs() + u64::from(duration.subsec_nanos() > 0)
}

#[async_trait]
impl Uploader for RcloneUploader {
    #[tracing::instrument(
        skip_all,
        fields(path = %local_path.display(), remote = %config.remote_target)
    )]
    async fn upload(&self, local_path: &Path, config: &PipelineConfig) -> UploadOutcome {
        let started = Instant::now();

        let mut child = match self.command(local_path, config).spawn() {
            Ok(child) => child,
            Err(e) => {
                let reason = if e.kind() == std::io::ErrorKind::NotFound {
                    format!("'{}' not found in PATH", self.config.binary)
                } else {
                    e.to_string()
                };
                tracing::error!(binary = %self.config.binary, error = %e, "Failed to start sync tool");
                return UploadOutcome::failed(
                    started.elapsed(),
                    FailureKind::SpawnFailed { reason },
                );
            }
        };

        // Stderr is drained concurrently into a bounded tail so a chatty tool
        // can neither fill the pipe nor grow memory.
        let stderr = child.stderr.take().map(|pipe| tokio::spawn(read_tail(pipe)));

        // On timeout the child is dropped on return, and kill_on_drop reaps it.
        match tokio::time::timeout(self.config.timeout, child.wait()).await {
            Ok(Ok(status)) => {
                let outcome = UploadOutcome::from_exit_code(status.code(), started.elapsed());
                if let Some(ref failure) = outcome.failure {
                    let tail = stderr_tail(stderr).await;
                    tracing::error!(
                        failure = %failure,
                        stderr = %tail,
                        "Sync tool reported failure"
                    );
                }
                outcome
            }
            Ok(Err(e)) => {
                tracing::error!(error = %e, "Lost track of sync tool process");
                UploadOutcome::failed(
                    started.elapsed(),
                    FailureKind::SpawnFailed {
                        reason: format!("wait failed: {}", e),
                    },
                )
            }
            Err(_) => {
                let after_secs = ceil_secs(self.config.timeout);
                tracing::error!(after_secs, "Sync tool timed out, killed");
                UploadOutcome::failed(started.elapsed(), FailureKind::TimedOut { after_secs })
            }
        }
    }
}
