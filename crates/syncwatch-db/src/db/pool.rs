//! SQLite pool setup and migrations

use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;

use syncwatch_core::AppError;

static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

/// Open (creating if needed) the history database and apply migrations.
///
/// WAL mode lets readers proceed while a writer holds the lock; the busy
/// timeout absorbs short write contention between workers instead of failing
/// the run.
pub async fn connect(path: &Path, max_connections: u32) -> Result<SqlitePool, AppError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            create_parent_dir(parent)?;
        }
    }

    tracing::info!(path = %path.display(), "Opening history database");

    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect_with(options)
        .await?;

    MIGRATOR.run(&pool).await?;

    tracing::info!(max_connections, "History database ready");
    Ok(pool)
}

fn create_parent_dir(dir: &Path) -> Result<(), AppError> {
    std::fs::create_dir_all(dir).map_err(|e| {
        tracing::error!(dir = %dir.display(), error = %e, "Failed to create database directory");
        AppError::Io(e)
    })
}
