use futures::future::join_all;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

use syncwatch_core::{ChannelKind, NotificationEvent, PipelineConfig};

use super::{
    EmailNotifier, NotificationChannel, NotifyError, PushNotifier, WebhookNotifier,
};

/// Per-channel result of one fan-out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: Vec<String>,
    /// `(channel, error)` pairs.
    pub failed: Vec<(String, String)>,
}

impl DispatchReport {
    pub fn attempted(&self) -> usize {
        self.delivered.len() + self.failed.len()
    }
}

/// Fans an event out to every enabled channel of the current settings
/// snapshot, plus any channels registered with [`Self::with_channel`].
pub struct NotificationDispatcher {
    client: Client,
    timeout: Duration,
    registered: Vec<Arc<dyn NotificationChannel>>,
}

impl NotificationDispatcher {
    pub fn new(timeout: Duration) -> Result<Self, NotifyError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            timeout,
            registered: Vec::new(),
        })
    }

    /// Register a channel that receives every event regardless of settings.
    pub fn with_channel(mut self, channel: Arc<dyn NotificationChannel>) -> Self {
        self.registered.push(channel);
        self
    }

    fn build(&self, kind: &ChannelKind) -> Result<Arc<dyn NotificationChannel>, NotifyError> {
        Ok(match kind {
            ChannelKind::Email(email) => Arc::new(EmailNotifier::new(email)?),
            ChannelKind::Push(push) => Arc::new(PushNotifier::new(self.client.clone(), push)),
            ChannelKind::Webhook(webhook) => {
                Arc::new(WebhookNotifier::new(self.client.clone(), webhook))
            }
        })
    }

    async fn send_one(
        &self,
        channel: Arc<dyn NotificationChannel>,
        event: &NotificationEvent,
    ) -> (String, Result<(), NotifyError>) {
        let name = channel.name().to_string();
        let result = match tokio::time::timeout(self.timeout, channel.send(event)).await {
            Ok(result) => result,
            Err(_) => Err(NotifyError::TimedOut(self.timeout.as_secs())),
        };
        (name, result)
    }

    /// Never fails: channel errors are logged and collected in the report.
    #[tracing::instrument(skip_all, fields(filename = %event.filename, status = %event.status))]
    pub async fn dispatch(
        &self,
        event: &NotificationEvent,
        config: &PipelineConfig,
    ) -> DispatchReport {
        let mut report = DispatchReport::default();
        let mut channels = self.registered.clone();

        for kind in config.enabled_channels() {
            match self.build(kind) {
                Ok(channel) => channels.push(channel),
                Err(e) => {
                    tracing::warn!(channel = kind.name(), error = %e, "Skipping misconfigured notification channel");
                    report.failed.push((kind.name().to_string(), e.to_string()));
                }
            }
        }

        if channels.is_empty() {
            return report;
        }

        let sends = channels
            .into_iter()
            .map(|channel| self.send_one(channel, event));

        for (name, result) in join_all(sends).await {
            match result {
                Ok(()) => {
                    tracing::debug!(channel = %name, "Notification delivered");
                    report.delivered.push(name);
                }
                Err(e) => {
                    tracing::warn!(channel = %name, error = %e, "Notification failed");
                    report.failed.push((name, e.to_string()));
                }
            }
        }

        tracing::info!(
            delivered = report.delivered.len(),
            failed = report.failed.len(),
            "Notifications dispatched"
        );
        report
    }
}
