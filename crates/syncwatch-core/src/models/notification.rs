use serde::Serialize;
use std::time::Duration;

use super::upload::{FailureKind, UploadStatus};

/// Payload fanned out to notification channels after an upload attempt.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationEvent {
    pub status: UploadStatus,
    pub filename: String,
    pub size: i64,
    #[serde(with = "elapsed_secs")]
    pub elapsed: Duration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
}

impl NotificationEvent {
    pub fn title(&self) -> String {
        match self.status {
            UploadStatus::Success => format!("Upload complete: {}", self.filename),
            UploadStatus::Failed => format!("Upload failed: {}", self.filename),
        }
    }

    /// Human readable body shared by every channel.
    pub fn body(&self) -> String {
        let mut body = format!(
            "File: {}\nSize: {:.2} MB\nElapsed: {:.1}s\nStatus: {}",
            self.filename,
            self.size as f64 / 1024.0 / 1024.0,
            self.elapsed.as_secs_f64(),
            self.status,
        );
        if let Some(ref failure) = self.failure {
            body.push_str(&format!("\nReason: {}", failure));
        }
        body
    }
}

mod elapsed_secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }
}
