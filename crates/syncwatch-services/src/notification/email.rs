use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use syncwatch_core::{EmailChannel, NotificationEvent};

use super::{NotificationChannel, NotifyError};

/// Plain-text mail over SMTP, STARTTLS unless the channel opts out.
pub struct EmailNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl EmailNotifier {
    /// Validates addresses and builds the transport. No connection is made here.
    pub fn new(config: &EmailChannel) -> Result<Self, NotifyError> {
        let from: Mailbox = config.from.parse().map_err(|e| {
            NotifyError::Config(format!("Invalid sender '{}': {}", config.from, e))
        })?;
        let to: Mailbox = config.to.parse().map_err(|e| {
            NotifyError::Config(format!("Invalid recipient '{}': {}", config.to, e))
        })?;

        let credentials = match (&config.username, &config.password) {
            (Some(u), Some(p)) => Some(Credentials::new(u.clone(), p.clone())),
            _ => None,
        };

        let builder = if config.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map_err(|e| NotifyError::Config(format!("Invalid SMTP host: {}", e)))?
                .port(config.port)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host).port(config.port)
        };
        let builder = match credentials {
            Some(credentials) => builder.credentials(credentials),
            None => builder,
        };

        Ok(Self {
            mailer: builder.build(),
            from,
            to,
        })
    }
}

#[async_trait]
impl NotificationChannel for EmailNotifier {
    fn name(&self) -> &str {
        "email"
    }

    async fn send(&self, event: &NotificationEvent) -> Result<(), NotifyError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(event.title())
            .header(ContentType::TEXT_PLAIN)
            .body(event.body())
            .map_err(|e| NotifyError::Smtp(e.to_string()))?;

        self.mailer
            .send(message)
            .await
            .map_err(|e| NotifyError::Smtp(e.to_string()))?;
        Ok(())
    }
}
