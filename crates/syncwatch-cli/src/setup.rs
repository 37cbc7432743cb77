//! Application setup
//!
//! Builds the collaborators every command needs from a validated
//! [`DaemonConfig`]. Telemetry is installed by `main` before any of this runs.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;

use syncwatch_core::DaemonConfig;
use syncwatch_db::LedgerRepository;
use syncwatch_services::{
    JsonSettingsProvider, NotificationDispatcher, RcloneConfig, RcloneUploader,
};
use syncwatch_worker::PipelineCoordinator;

pub async fn setup_ledger(config: &DaemonConfig) -> Result<LedgerRepository> {
    let pool = syncwatch_db::connect(&config.database_path, config.db_max_connections)
        .await
        .with_context(|| {
            format!(
                "Failed to open history database at {}",
                config.database_path.display()
            )
        })?;
    Ok(LedgerRepository::new(pool))
}

pub fn rclone_config(config: &DaemonConfig) -> RcloneConfig {
    RcloneConfig {
        binary: config.rclone_binary.clone(),
        log_file: config.rclone_log_file.clone(),
        log_level: config.rclone_log_level.clone(),
        config_path: config.rclone_config.clone(),
        timeout: Duration::from_secs(config.upload_timeout_secs),
    }
}

/// Wire the coordinator to the real sync tool, settings file and channels.
pub fn setup_coordinator(
    config: &DaemonConfig,
    ledger: LedgerRepository,
) -> Result<Arc<PipelineCoordinator>> {
    if let Some(dir) = config.rclone_log_file.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
    }

    let settings = JsonSettingsProvider::new(&config.settings_file, &config.rclone_remote);
    let uploader = RcloneUploader::new(rclone_config(config));
    let notifier = NotificationDispatcher::new(Duration::from_secs(config.notify_timeout_secs))
        .context("Failed to build notification HTTP client")?;

    tracing::info!(
        watch_dir = %config.watch_dir.display(),
        settings_file = %config.settings_file.display(),
        rclone = %config.rclone_binary,
        "Pipeline initialized"
    );

    Ok(Arc::new(PipelineCoordinator::new(
        &config.watch_dir,
        Arc::new(settings),
        ledger,
        Arc::new(uploader),
        Arc::new(notifier),
    )))
}
