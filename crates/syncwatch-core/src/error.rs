//! Error types module
//!
//! `AppError` is the error returned by the ledger and the pipeline coordinator.
//! The `Database` variant and `From<sqlx::Error>` are gated behind the `sqlx`
//! feature so the model types can be used without pulling in a database driver.

use std::io;

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[cfg(not(feature = "sqlx"))]
    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(feature = "sqlx")]
impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::Database(err)
    }
}

#[cfg(feature = "sqlx")]
impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AppError::Database(SqlxError::Migrate(Box::new(err)))
    }
}
