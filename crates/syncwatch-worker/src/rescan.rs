//! Periodic re-scan of the watch root
//!
//! Off by default. When enabled, every regular file under the root is
//! enqueued on each tick, starting with one pass at startup. This catches
//! files that settled without a further filesystem event. Files already
//! uploaded are skipped by the ledger check.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use walkdir::WalkDir;

use syncwatch_core::{is_transient_path, FileTask};

use crate::queue::TaskSender;

pub struct Rescanner {
    root: PathBuf,
    interval: Duration,
    sender: TaskSender,
}

impl Rescanner {
    pub fn new(root: impl Into<PathBuf>, interval: Duration, sender: TaskSender) -> Self {
        Self {
            root: root.into(),
            interval,
            sender,
        }
    }

    /// Regular, non-transient files under `root`. Unreadable entries are skipped.
    pub fn scan(root: &Path) -> Vec<PathBuf> {
        WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping unreadable entry during rescan");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| !is_transient_path(path))
            .collect()
    }

    /// One pass. Returns the number of tasks enqueued.
    pub async fn run_once(&self) -> Result<usize> {
        let root = self.root.clone();
        let paths = tokio::task::spawn_blocking(move || Self::scan(&root))
            .await
            .context("Rescan walker panicked")?;

        let mut enqueued = 0;
        for path in paths {
            self.sender
                .send(FileTask::new(path))
                .await
                .map_err(|_| anyhow::anyhow!("Task queue is closed"))?;
            enqueued += 1;
        }

        tracing::info!(root = %self.root.display(), enqueued, "Rescan complete");
        Ok(enqueued)
    }

    pub fn spawn(self, mut shutdown_rx: mpsc::Receiver<()>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            tracing::info!(interval_secs = self.interval.as_secs(), "Periodic rescan enabled");

            loop {
                tokio::select! {
                    _ = interval.tick() => {}
                    _ = shutdown_rx.recv() => break,
                }
                // A pass can block on a full queue, so it races shutdown too.
                tokio::select! {
                    result = self.run_once() => {
                        if let Err(e) = result {
                            tracing::error!(error = %e, "Rescan failed, stopping");
                            break;
                        }
                    }
                    _ = shutdown_rx.recv() => break,
                }
            }
            tracing::info!("Periodic rescan stopped");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_lists_regular_files_and_skips_transient() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("show/s1")).unwrap();
        std::fs::write(root.path().join("movie.mkv"), b"1").unwrap();
        std::fs::write(root.path().join("show/s1/ep1.mkv"), b"2").unwrap();
        std::fs::write(root.path().join("show/s1/ep2.mkv.aria2"), b"3").unwrap();

        let mut found = Rescanner::scan(root.path());
        found.sort();

        assert_eq!(
            found,
            vec![
                root.path().join("movie.mkv"),
                root.path().join("show/s1/ep1.mkv"),
            ]
        );
    }

    #[tokio::test]
    async fn run_once_enqueues_every_file() {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join("a.bin"), b"a").unwrap();
        std::fs::write(root.path().join("b.bin"), b"b").unwrap();

        let (tx, mut rx) = mpsc::channel(8);
        let rescanner = Rescanner::new(root.path(), Duration::from_secs(60), tx);

        assert_eq!(rescanner.run_once().await.unwrap(), 2);
        let mut names = vec![
            rx.recv().await.unwrap().filename().unwrap(),
            rx.recv().await.unwrap().filename().unwrap(),
        ];
        names.sort();
        assert_eq!(names, vec!["a.bin", "b.bin"]);
    }

    #[tokio::test]
    async fn spawned_rescanner_stops_on_shutdown() {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join("a.bin"), b"a").unwrap();

        let (tx, mut rx) = mpsc::channel(8);
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let handle = Rescanner::new(root.path(), Duration::from_secs(3600), tx).spawn(shutdown_rx);

        // First tick fires immediately.
        assert_eq!(rx.recv().await.unwrap().filename().as_deref(), Some("a.bin"));

        shutdown_tx.send(()).await.unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn shutdown_interrupts_a_pass_blocked_on_a_full_queue() {
        let root = tempfile::tempdir().unwrap();
        for i in 0..5 {
            std::fs::write(root.path().join(format!("{}.bin", i)), b"x").unwrap();
        }

        // Nobody drains this queue, so the pass stalls after the first send.
        let (tx, _rx) = mpsc::channel(1);
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let handle = Rescanner::new(root.path(), Duration::from_secs(3600), tx).spawn(shutdown_rx);

        tokio::time::sleep(Duration::from_millis(200)).await;
        shutdown_tx.send(()).await.unwrap();

        tokio::time::timeout(Duration::from_secs(3), handle)
            .await
            .expect("rescanner did not stop")
            .unwrap();
    }
}
