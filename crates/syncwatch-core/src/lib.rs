//! Syncwatch Core Library
//!
//! This crate provides the domain models, error types, configuration and the
//! settings seam shared by every syncwatch component. It has no knowledge of
//! the filesystem watcher, the sync tool or the notification transports.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod settings;

// Re-export commonly used types
pub use config::DaemonConfig;
pub use error::AppError;
pub use models::{
    is_transient_name, is_transient_path, FailureKind, FileTask, NotificationEvent,
    UploadOutcome, UploadRecord, UploadStatus,
};
pub use settings::{
    ChannelKind, EmailChannel, NotificationChannelConfig, PipelineConfig, PushChannel,
    SettingsProvider, StaticSettings, TransferTuning, WebhookChannel,
};
