use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use syncwatch_core::{AppError, UploadRecord, UploadStatus};

/// Repository for the upload history (dedup ledger).
///
/// Every method is a single short statement, so concurrent writers only
/// contend for SQLite's write lock for the duration of one upsert.
#[derive(Clone)]
pub struct LedgerRepository {
    pool: SqlitePool,
}

impl LedgerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Recorded status for the exact `(filename, size)` pair, if any.
    #[tracing::instrument(skip(self))]
    pub async fn lookup(
        &self,
        filename: &str,
        size: i64,
    ) -> Result<Option<UploadStatus>, AppError> {
        let row = sqlx::query(
            r#"
            SELECT status
            FROM history
            WHERE filename = ? AND size = ?
            "#,
        )
        .bind(filename)
        .bind(size)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            let status: String = row.try_get("status")?;
            status
                .parse::<UploadStatus>()
                .map_err(|e| AppError::Internal(e.to_string()))
        })
        .transpose()
    }

    /// Insert-or-replace keyed by `(filename, size)`. The last call for a key wins.
    #[tracing::instrument(skip(self))]
    pub async fn record(
        &self,
        filename: &str,
        size: i64,
        upload_time: DateTime<Utc>,
        status: UploadStatus,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO history (filename, size, upload_time, status)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(filename)
        .bind(size)
        .bind(upload_time)
        .bind(status.as_str())
        .execute(&self.pool)
        .await?;

        tracing::debug!(filename, size, status = %status, "Upload outcome recorded");
        Ok(())
    }

    /// Delete every row. Returns the number of rows removed.
    pub async fn clear(&self) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM history")
            .execute(&self.pool)
            .await?;

        tracing::info!(deleted = result.rows_affected(), "Upload history cleared");
        Ok(result.rows_affected())
    }

    /// Most recently written rows first.
    pub async fn list_recent(&self, limit: i64) -> Result<Vec<UploadRecord>, AppError> {
        let rows = sqlx::query(
            r#"
            SELECT filename, size, upload_time, status
            FROM history
            ORDER BY id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| -> Result<UploadRecord, AppError> {
                let status: String = row.try_get("status")?;
                Ok(UploadRecord {
                    filename: row.try_get("filename")?,
                    size: row.try_get("size")?,
                    upload_time: row.try_get("upload_time")?,
                    status: status
                        .parse()
                        .map_err(|e: anyhow::Error| AppError::Internal(e.to_string()))?,
                })
            })
            .collect()
    }

    pub async fn count(&self) -> Result<i64, AppError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM history")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
