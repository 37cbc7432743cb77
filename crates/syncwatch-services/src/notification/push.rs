use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use reqwest::Client;

use syncwatch_core::{NotificationEvent, PushChannel};

use super::{ensure_success, NotificationChannel, NotifyError};

/// Push via HTTP GET. Title and body are percent-encoded into the template.
pub struct PushNotifier {
    client: Client,
    url_template: String,
}

impl PushNotifier {
    pub fn new(client: Client, config: &PushChannel) -> Self {
        Self {
            client,
            url_template: config.url_template.clone(),
        }
    }

    pub fn render_url(&self, title: &str, content: &str) -> String {
        self.url_template
            .replace("{title}", &utf8_percent_encode(title, NON_ALPHANUMERIC).to_string())
            .replace(
                "{content}",
                &utf8_percent_encode(content, NON_ALPHANUMERIC).to_string(),
            )
    }
}

#[async_trait]
impl NotificationChannel for PushNotifier {
    fn name(&self) -> &str {
        "push"
    }

    async fn send(&self, event: &NotificationEvent) -> Result<(), NotifyError> {
        let url = self.render_url(&event.title(), &event.body());
        let response = self.client.get(&url).send().await?;
        ensure_success(response).await
    }
}
