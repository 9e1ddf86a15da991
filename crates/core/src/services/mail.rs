//! Outgoing mail delivery.
//!
//! Services hand rendered mails to a [`MailDelivery`]. The server picks the
//! implementation: [`SmtpMailer`] sends directly, the queue crate pushes the
//! mail onto a durable Redis queue, and [`NoOpMailer`] drops it when no SMTP
//! server is configured.

use std::sync::Arc;
use std::time::Duration;

use agora_common::{AppError, AppResult, config::EmailConfig};
use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// A rendered mail ready to send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    /// HTML body.
    pub body: String,
}

/// Sink for rendered mails.
#[async_trait]
pub trait MailDelivery: Send + Sync {
    async fn deliver(&self, mail: OutgoingMail) -> AppResult<()>;
}

/// Shared mail sink.
pub type SharedMailer = Arc<dyn MailDelivery>;

/// Drops every mail.
pub struct NoOpMailer;

#[async_trait]
impl MailDelivery for NoOpMailer {
    async fn deliver(&self, mail: OutgoingMail) -> AppResult<()> {
        debug!(to = %mail.to, subject = %mail.subject, "Mail disabled, dropping message");
        Ok(())
    }
}

/// SMTP sender.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Build from configuration; `None` when no SMTP host is set.
    pub fn from_config(config: &EmailConfig) -> AppResult<Option<Self>> {
        let Some(host) = config.smtp_host.as_deref().filter(|h| !h.is_empty()) else {
            return Ok(None);
        };

        // Port 465 speaks TLS from the first byte, everything else upgrades.
        let builder = if config.smtp_port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
        }
        .map_err(|e| AppError::Config(format!("SMTP setup failed: {e}")))?
        .port(config.smtp_port)
        .timeout(Some(Duration::from_secs(config.timeout_secs)));

        let builder = match (&config.smtp_username, &config.smtp_password) {
            (Some(user), Some(password)) => {
                builder.credentials(Credentials::new(user.clone(), password.clone()))
            }
            _ => builder,
        };

        let from = format!("{} <{}>", config.from_name, config.from_address)
            .parse::<Mailbox>()
            .map_err(|e| AppError::Config(format!("Invalid from address: {e}")))?;

        Ok(Some(Self {
            transport: builder.build(),
            from,
        }))
    }
}

#[async_trait]
impl MailDelivery for SmtpMailer {
    async fn deliver(&self, mail: OutgoingMail) -> AppResult<()> {
        let to = mail
            .to
            .parse::<Mailbox>()
            .map_err(|e| AppError::BadRequest(format!("Invalid recipient address: {e}")))?;
        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(mail.subject.as_str())
            .header(ContentType::TEXT_HTML)
            .body(mail.body)
            .map_err(|e| AppError::Internal(format!("Failed to build email: {e}")))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::ExternalService(format!("Failed to send email: {e}")))?;

        info!(to = %mail.to, subject = %mail.subject, "Mail sent");
        Ok(())
    }
}
