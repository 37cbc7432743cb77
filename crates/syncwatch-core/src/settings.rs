//! Per-run pipeline settings
//!
//! A [`PipelineConfig`] is a read-only snapshot taken at the start of every
//! pipeline run. Settings may change between runs, so nothing downstream keeps
//! a copy across files. Where the snapshot comes from is decided by the
//! [`SettingsProvider`] implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::constants::{
    DEFAULT_BUFFER_SIZE, DEFAULT_CHECKERS, DEFAULT_CHECK_DURATION_SECS, DEFAULT_REMOTE_TARGET,
    DEFAULT_TRANSFERS,
};

/// Tuning flags handed to the sync tool verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferTuning {
    pub buffer_size: String,
    pub transfers: String,
    pub checkers: String,
}

impl Default for TransferTuning {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE.to_string(),
            transfers: DEFAULT_TRANSFERS.to_string(),
            checkers: DEFAULT_CHECKERS.to_string(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_smtp_port() -> u16 {
    587
}

/// SMTP delivery to a single recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailChannel {
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    pub from: String,
    pub to: String,
    /// Use STARTTLS; plain SMTP otherwise.
    #[serde(default = "default_true")]
    pub starttls: bool,
}

/// HTTP GET against a URL template with `{title}` and `{content}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushChannel {
    pub url_template: String,
}

/// HTTP POST of `{"title": .., "description": ..}` to a fixed URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookChannel {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChannelKind {
    Email(EmailChannel),
    Push(PushChannel),
    Webhook(WebhookChannel),
}

impl ChannelKind {
    pub fn name(&self) -> &'static str {
        match self {
            ChannelKind::Email(_) => "email",
            ChannelKind::Push(_) => "push",
            ChannelKind::Webhook(_) => "webhook",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationChannelConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(flatten)]
    pub kind: ChannelKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Stability sampling interval in seconds.
    pub check_duration: u64,
    pub prevent_reupload: bool,
    pub auto_delete: bool,
    /// Remote identifier plus path, e.g. `gdrive:/incoming`.
    pub remote_target: String,
    pub transfer_tuning: TransferTuning,
    pub notification_channels: Vec<NotificationChannelConfig>,
}

impl PipelineConfig {
    pub fn check_duration(&self) -> Duration {
        Duration::from_secs(self.check_duration)
    }

    pub fn enabled_channels(&self) -> impl Iterator<Item = &ChannelKind> {
        self.notification_channels
            .iter()
            .filter(|c| c.enabled)
            .map(|c| &c.kind)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            check_duration: DEFAULT_CHECK_DURATION_SECS,
            prevent_reupload: true,
            auto_delete: true,
            remote_target: DEFAULT_REMOTE_TARGET.to_string(),
            transfer_tuning: TransferTuning::default(),
            notification_channels: Vec::new(),
        }
    }
}

/// Source of pipeline settings. Called once at the start of every run.
///
/// Implementations never fail: an unreadable source degrades to defaults so a
/// broken settings file cannot stall ingestion.
#[async_trait]
pub trait SettingsProvider: Send + Sync {
    async fn snapshot(&self) -> PipelineConfig;
}

/// Provider that always returns the same snapshot.
#[derive(Debug, Clone, Default)]
pub struct StaticSettings(pub PipelineConfig);

#[async_trait]
impl SettingsProvider for StaticSettings {
    async fn snapshot(&self) -> PipelineConfig {
        self.0.clone()
    }
}
