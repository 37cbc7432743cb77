//! `syncwatch watch`: the long-running daemon.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use syncwatch_core::DaemonConfig;
use syncwatch_worker::{
    EventIngestor, FileTaskQueue, PipelineCoordinator, QueueConfig, Rescanner, TaskHandler,
};

pub async fn run(config: &DaemonConfig, coordinator: Arc<PipelineCoordinator>) -> Result<()> {
    let handler: Arc<dyn TaskHandler> = coordinator;
    let queue = FileTaskQueue::start(
        handler,
        QueueConfig {
            max_workers: config.worker_max,
            capacity: config.queue_capacity,
        },
    );

    // A watch that cannot be established is fatal at startup.
    let ingestor = EventIngestor::start(&config.watch_dir, queue.sender())
        .context("Failed to start filesystem watcher")?;

    let rescan = if config.rescan_enabled() {
        let (tx, rx) = mpsc::channel(1);
        let handle = Rescanner::new(
            &config.watch_dir,
            Duration::from_secs(config.rescan_interval_secs),
            queue.sender(),
        )
        .spawn(rx);
        Some((tx, handle))
    } else {
        None
    };

    tracing::info!(
        root = %ingestor.root().display(),
        workers = config.worker_max,
        "syncwatch running"
    );

    shutdown_signal().await;

    drop(ingestor);
    if let Some((tx, handle)) = rescan {
        let _ = tx.send(()).await;
        if let Err(e) = handle.await {
            tracing::warn!(error = %e, "Rescanner task ended abnormally");
        }
    }
    queue.shutdown().await?;

    tracing::info!("syncwatch stopped");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal");
        },
    }

    tracing::info!("Shutting down, waiting for in-flight uploads");
}
