use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use syncwatch_core::{NotificationEvent, WebhookChannel};

use super::{ensure_success, NotificationChannel, NotifyError};

#[derive(Debug, Serialize)]
struct WebhookPayload {
    title: String,
    description: String,
}

/// JSON POST to a fixed URL.
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(client: Client, config: &WebhookChannel) -> Self {
        Self {
            client,
            url: config.url.clone(),
        }
    }
}

#[async_trait]
impl NotificationChannel for WebhookNotifier {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn send(&self, event: &NotificationEvent) -> Result<(), NotifyError> {
        let payload = WebhookPayload {
            title: event.title(),
            description: event.body(),
        };
        let response = self.client.post(&self.url).json(&payload).send().await?;
        ensure_success(response).await
    }
}
