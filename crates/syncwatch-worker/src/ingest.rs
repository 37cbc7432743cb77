//! Filesystem event ingestion
//!
//! Watches the root recursively and turns file creations and moves into the
//! tree into [`FileTask`]s. Directory events are dropped, except that a
//! directory moved in as a whole has its files enqueued. Repeated events for
//! one path are not collapsed here; the ledger absorbs them.

use notify::event::{CreateKind, ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

use syncwatch_core::FileTask;

use crate::queue::TaskSender;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Watch root {0} does not exist or is not a directory")]
    MissingRoot(PathBuf),

    #[error("Failed to watch {path}: {source}")]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
}

/// Live watcher. Dropping it stops event delivery.
pub struct EventIngestor {
    _watcher: RecommendedWatcher,
    root: PathBuf,
}

impl EventIngestor {
    /// Fails if the root cannot be watched; callers treat that as fatal.
    pub fn start(root: &Path, sender: TaskSender) -> Result<Self, IngestError> {
        if !root.is_dir() {
            return Err(IngestError::MissingRoot(root.to_path_buf()));
        }

        let watch_err = |source| IngestError::Watch {
            path: root.to_path_buf(),
            source,
        };

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                for path in candidate_paths(&event) {
                    let task = FileTask::new(path);
                    tracing::debug!(task_id = %task.id, path = %task.path.display(), "File discovered");
                    // Runs on the watcher thread; waiting here is the backpressure.
                    if sender.blocking_send(task).is_err() {
                        tracing::debug!("Task queue closed, dropping event");
                        return;
                    }
                }
            }
            Err(e) => tracing::warn!(error = %e, "Filesystem watch error"),
        })
        .map_err(watch_err)?;

        watcher
            .watch(root, RecursiveMode::Recursive)
            .map_err(watch_err)?;

        tracing::info!(root = %root.display(), "Watching for new files");
        Ok(Self {
            _watcher: watcher,
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Paths an event should turn into tasks.
fn candidate_paths(event: &Event) -> Vec<PathBuf> {
    let target = match event.kind {
        EventKind::Create(CreateKind::Folder) => return Vec::new(),
        EventKind::Create(_) => event.paths.first(),
        // Both carries [from, to]; To carries the destination only.
        EventKind::Modify(ModifyKind::Name(RenameMode::To))
        | EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => event.paths.last(),
        // Platforms that cannot tell the two ends apart: keep it if it exists now.
        EventKind::Modify(ModifyKind::Name(RenameMode::Any)) => {
            event.paths.iter().rev().find(|p| p.exists())
        }
        _ => None,
    };

    match target {
        Some(path) if path.is_dir() => files_under(path),
        Some(path) => vec![path.clone()],
        None => Vec::new(),
    }
}

fn files_under(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{DataChange, RemoveKind};
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn event(kind: EventKind, paths: Vec<PathBuf>) -> Event {
        paths
            .into_iter()
            .fold(Event::new(kind), |event, path| event.add_path(path))
    }

    #[test]
    fn create_file_yields_its_path() {
        let paths = candidate_paths(&event(
            EventKind::Create(CreateKind::File),
            vec![PathBuf::from("/watch/movie.mkv")],
        ));
        assert_eq!(paths, vec![PathBuf::from("/watch/movie.mkv")]);
    }

    #[test]
    fn rename_uses_destination() {
        let paths = candidate_paths(&event(
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
            vec![
                PathBuf::from("/watch/movie.mkv.part"),
                PathBuf::from("/watch/movie.mkv"),
            ],
        ));
        assert_eq!(paths, vec![PathBuf::from("/watch/movie.mkv")]);
    }

    #[test]
    fn rename_source_side_and_other_kinds_are_ignored() {
        for kind in [
            EventKind::Modify(ModifyKind::Name(RenameMode::From)),
            EventKind::Modify(ModifyKind::Data(DataChange::Content)),
            EventKind::Remove(RemoveKind::File),
            EventKind::Create(CreateKind::Folder),
        ] {
            assert!(candidate_paths(&event(kind, vec![PathBuf::from("/watch/x")])).is_empty());
        }
    }

    #[test]
    fn directory_moved_in_yields_its_files() {
        let root = tempfile::tempdir().unwrap();
        let season = root.path().join("season1");
        std::fs::create_dir_all(season.join("extras")).unwrap();
        std::fs::write(season.join("ep1.mkv"), b"1").unwrap();
        std::fs::write(season.join("extras/bts.mkv"), b"2").unwrap();

        let mut paths = candidate_paths(&event(
            EventKind::Modify(ModifyKind::Name(RenameMode::To)),
            vec![season.clone()],
        ));
        paths.sort();

        assert_eq!(paths, vec![season.join("ep1.mkv"), season.join("extras/bts.mkv")]);
    }

    #[test]
    fn missing_root_is_fatal() {
        let (tx, _rx) = mpsc::channel(1);
        let err = EventIngestor::start(Path::new("/definitely/not/here"), tx)
            .err()
            .unwrap();
        assert!(matches!(err, IngestError::MissingRoot(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn new_file_becomes_a_task() {
        let root = tempfile::tempdir().unwrap();
        let (tx, mut rx) = mpsc::channel(16);
        let _ingestor = EventIngestor::start(root.path(), tx).unwrap();

        std::fs::write(root.path().join("movie.mkv"), b"data").unwrap();

        let task = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(task.filename().as_deref(), Some("movie.mkv"));
    }
}
