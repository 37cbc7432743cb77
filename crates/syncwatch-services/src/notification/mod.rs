//! Outbound notifications
//!
//! Every channel implements [`NotificationChannel`]. The dispatcher builds the
//! configured channels from the run's settings snapshot and fans an event out
//! to all of them concurrently. One channel failing never affects another.

mod dispatcher;
mod email;
mod push;
mod webhook;

use async_trait::async_trait;
use syncwatch_core::NotificationEvent;
use thiserror::Error;

pub use dispatcher::{DispatchReport, NotificationDispatcher};
pub use email::EmailNotifier;
pub use push::PushNotifier;
pub use webhook::WebhookNotifier;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Invalid channel configuration: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Channel responded with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("SMTP delivery failed: {0}")]
    Smtp(String),

    #[error("Timed out after {0}s")]
    TimedOut(u64),
}

#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &str;

    async fn send(&self, event: &NotificationEvent) -> Result<(), NotifyError>;
}

/// Shared status check for the HTTP channels.
async fn ensure_success(response: reqwest::Response) -> Result<(), NotifyError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(NotifyError::Status {
        status: status.as_u16(),
        body,
    })
}
