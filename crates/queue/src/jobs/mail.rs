//! Mail delivery job.

use agora_core::OutgoingMail;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Job to send one rendered mail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailJob {
    /// The message as rendered by the notification worker.
    pub mail: OutgoingMail,

    /// When the message was queued.
    pub queued_at: DateTime<Utc>,
}

impl MailJob {
    /// Create a new mail job.
    #[must_use]
    pub fn new(mail: OutgoingMail) -> Self {
        Self {
            mail,
            queued_at: Utc::now(),
        }
    }
}

impl From<OutgoingMail> for MailJob {
    fn from(mail: OutgoingMail) -> Self {
        Self::new(mail)
    }
}
