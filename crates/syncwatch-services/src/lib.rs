//! Syncwatch Services Layer
//!
//! The collaborators a pipeline run drives: the stability gate, the sync tool
//! invoker, the settings provider and the notification fan-out. None of them
//! know about each other; the worker crate wires them together.

pub mod notification;
pub mod settings;
pub mod stability;
pub mod uploader;

pub use notification::{
    DispatchReport, EmailNotifier, NotificationChannel, NotificationDispatcher, NotifyError,
    PushNotifier, WebhookNotifier,
};
pub use settings::JsonSettingsProvider;
pub use stability::{check_stability, is_stable, Stability};
pub use uploader::{RcloneConfig, RcloneUploader, Uploader};
