//! Settings file provider
//!
//! Reads the flat settings document written by the admin surface:
//!
//! ```json
//! {
//!   "check_duration": 10,
//!   "prevent_reupload": true,
//!   "auto_delete": true,
//!   "rclone_buffer": "64M",
//!   "rclone_transfers": "4",
//!   "rclone_checkers": "8",
//!   "remote_target": "gdrive:/incoming",
//!   "notification_channels": []
//! }
//! ```
//!
//! The file is re-read on every snapshot. Missing keys take their defaults; a
//! missing or unparsable file yields the full default set.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::path::PathBuf;

use syncwatch_core::constants::{
    DEFAULT_BUFFER_SIZE, DEFAULT_CHECKERS, DEFAULT_CHECK_DURATION_SECS, DEFAULT_TRANSFERS,
};
use syncwatch_core::{
    NotificationChannelConfig, PipelineConfig, SettingsProvider, TransferTuning,
};

fn default_check_duration() -> u64 {
    DEFAULT_CHECK_DURATION_SECS
}

fn default_true() -> bool {
    true
}

fn default_buffer() -> String {
    DEFAULT_BUFFER_SIZE.to_string()
}

fn default_transfers() -> String {
    DEFAULT_TRANSFERS.to_string()
}

fn default_checkers() -> String {
    DEFAULT_CHECKERS.to_string()
}

/// Tuning values are handed to the sync tool as-is; accept `"4"` or `4`.
fn opaque_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}

/// Accepts `10` or `"10"`.
fn lenient_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| serde::de::Error::custom("check_duration must be a non-negative integer")),
        Value::String(s) => s.trim().parse().map_err(serde::de::Error::custom),
        other => Err(serde::de::Error::custom(format!(
            "expected integer, got {}",
            other
        ))),
    }
}

#[derive(Debug, Deserialize)]
struct SettingsDocument {
    #[serde(default = "default_check_duration", deserialize_with = "lenient_u64")]
    check_duration: u64,
    #[serde(default = "default_true")]
    prevent_reupload: bool,
    #[serde(default = "default_true")]
    auto_delete: bool,
    #[serde(default)]
    remote_target: Option<String>,
    #[serde(default = "default_buffer", deserialize_with = "opaque_string")]
    rclone_buffer: String,
    #[serde(default = "default_transfers", deserialize_with = "opaque_string")]
    rclone_transfers: String,
    #[serde(default = "default_checkers", deserialize_with = "opaque_string")]
    rclone_checkers: String,
    #[serde(default)]
    notification_channels: Vec<NotificationChannelConfig>,
}

impl SettingsDocument {
    fn into_config(self, default_remote: &str) -> PipelineConfig {
        PipelineConfig {
            check_duration: self.check_duration,
            prevent_reupload: self.prevent_reupload,
            auto_delete: self.auto_delete,
            remote_target: self
                .remote_target
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| default_remote.to_string()),
            transfer_tuning: TransferTuning {
                buffer_size: self.rclone_buffer,
                transfers: self.rclone_transfers,
                checkers: self.rclone_checkers,
            },
            notification_channels: self.notification_channels,
        }
    }
}

/// [`SettingsProvider`] backed by a JSON file on disk.
pub struct JsonSettingsProvider {
    path: PathBuf,
    /// Remote used when the document does not name one.
    default_remote: String,
}

impl JsonSettingsProvider {
    pub fn new(path: impl Into<PathBuf>, default_remote: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            default_remote: default_remote.into(),
        }
    }

    fn defaults(&self) -> PipelineConfig {
        PipelineConfig {
            remote_target: self.default_remote.clone(),
            ..Default::default()
        }
    }
}

#[async_trait]
impl SettingsProvider for JsonSettingsProvider {
    async fn snapshot(&self) -> PipelineConfig {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "No settings file, using defaults");
                return self.defaults();
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Settings file unreadable, using defaults");
                return self.defaults();
            }
        };

        match serde_json::from_str::<SettingsDocument>(&raw) {
            Ok(doc) => doc.into_config(&self.default_remote),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Settings file malformed, using defaults");
                self.defaults()
            }
        }
    }
}
