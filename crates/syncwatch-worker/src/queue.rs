//! File task queue: bounded channel feeding a fixed-size worker pool.
//!
//! Producers (the ingestor, the rescanner, the CLI) hold a [`TaskSender`].
//! When the channel is full they wait, which bounds memory no matter how fast
//! events arrive. [`FileTaskQueue::shutdown`] stops intake and then waits for
//! in-flight runs; it never cancels them.

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;

use syncwatch_core::FileTask;

use crate::context::TaskHandler;

pub type TaskSender = mpsc::Sender<FileTask>;

#[derive(Debug, Clone)]
pub struct QueueConfig {
    pub max_workers: usize,
    /// Tasks buffered before producers start waiting.
    pub capacity: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_workers: 4,
            capacity: 1024,
        }
    }
}

pub struct FileTaskQueue {
    sender: TaskSender,
    shutdown_tx: mpsc::Sender<()>,
    pool: JoinHandle<()>,
}

impl FileTaskQueue {
    /// Spawn the worker pool. Must be called inside a tokio runtime.
    pub fn start(handler: Arc<dyn TaskHandler>, config: QueueConfig) -> Self {
        let (sender, receiver) = mpsc::channel(config.capacity.max(1));
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let pool = tokio::spawn(Self::worker_pool(handler, config, receiver, shutdown_rx));

        Self {
            sender,
            shutdown_tx,
            pool,
        }
    }

    pub fn sender(&self) -> TaskSender {
        self.sender.clone()
    }

    pub async fn submit(&self, task: FileTask) -> Result<()> {
        self.sender
            .send(task)
            .await
            .map_err(|_| anyhow::anyhow!("Task queue is closed"))
    }

    /// Stop taking new tasks and wait for running ones to finish. Tasks still
    /// buffered in the channel are dropped.
    pub async fn shutdown(self) -> Result<()> {
        let _ = self.shutdown_tx.send(()).await;
        drop(self.sender);
        self.pool.await.context("Worker pool panicked")
    }

    async fn worker_pool(
        handler: Arc<dyn TaskHandler>,
        config: QueueConfig,
        mut receiver: mpsc::Receiver<FileTask>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        let max_workers = config.max_workers.max(1);
        tracing::info!(
            max_workers,
            capacity = config.capacity,
            "File task worker pool started"
        );

        let semaphore = Arc::new(Semaphore::new(max_workers));

        loop {
            // Hold a free worker slot before taking a task off the channel so
            // a full pool leaves tasks queued, where producers can see it.
            let permit = tokio::select! {
                biased;
                _ = shutdown_rx.recv() => break,
                permit = semaphore.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let task = tokio::select! {
                biased;
                _ = shutdown_rx.recv() => break,
                task = receiver.recv() => match task {
                    Some(task) => task,
                    None => break,
                },
            };

            let handler = handler.clone();
            tokio::spawn(async move {
                let _permit = permit;
                let task_id = task.id;
                let path = task.path.clone();
                if let Err(e) = handler.handle(task).await {
                    tracing::error!(
                        task_id = %task_id,
                        path = %path.display(),
                        error = %e,
                        "Pipeline run failed"
                    );
                }
            });
        }

        tracing::info!("File task worker pool draining in-flight runs");
        receiver.close();
        // Every permit back means every spawned run has finished.
        let _ = semaphore.acquire_many(max_workers as u32).await;
        tracing::info!("File task worker pool stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct SlowHandler {
        running: AtomicUsize,
        peak: AtomicUsize,
        done: AtomicUsize,
    }

    #[async_trait]
    impl TaskHandler for SlowHandler {
        async fn handle(&self, _task: FileTask) -> Result<()> {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            self.running.fetch_sub(1, Ordering::SeqCst);
            self.done.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingHandler(AtomicUsize);

    #[async_trait]
    impl TaskHandler for FailingHandler {
        async fn handle(&self, _task: FileTask) -> Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Err(anyhow::anyhow!("ledger unavailable"))
        }
    }

    #[tokio::test]
    async fn concurrency_never_exceeds_worker_count() {
        let handler = Arc::new(SlowHandler::default());
        let queue = FileTaskQueue::start(
            handler.clone(),
            QueueConfig {
                max_workers: 3,
                capacity: 4,
            },
        );

        for i in 0..12 {
            queue
                .submit(FileTask::new(format!("/watch/file-{i}.bin")))
                .await
                .unwrap();
        }

        // Let the pool take everything off the channel before stopping intake.
        while handler.done.load(Ordering::SeqCst) < 12 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        queue.shutdown().await.unwrap();

        assert_eq!(handler.peak.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn shutdown_waits_for_in_flight_runs() {
        let handler = Arc::new(SlowHandler::default());
        let queue = FileTaskQueue::start(handler.clone(), QueueConfig::default());

        queue.submit(FileTask::new("/watch/a.bin")).await.unwrap();
        while handler.running.load(Ordering::SeqCst) == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        queue.shutdown().await.unwrap();
        assert_eq!(handler.done.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn handler_errors_do_not_stop_the_pool() {
        let handler = Arc::new(FailingHandler(AtomicUsize::new(0)));
        let queue = FileTaskQueue::start(handler.clone(), QueueConfig::default());

        for _ in 0..3 {
            queue.submit(FileTask::new("/watch/x.bin")).await.unwrap();
        }
        while handler.0.load(Ordering::SeqCst) < 3 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        queue.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn submit_after_pool_exit_is_an_error() {
        let handler = Arc::new(SlowHandler::default());
        let queue = FileTaskQueue::start(handler, QueueConfig::default());
        let sender = queue.sender();
        queue.shutdown().await.unwrap();

        assert!(sender.send(FileTask::new("/watch/late.bin")).await.is_err());
    }
}
