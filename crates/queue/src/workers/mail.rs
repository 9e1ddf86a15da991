//! Mail worker.

use std::sync::Arc;

use agora_core::SharedMailer;
use apalis::prelude::*;
use chrono::Utc;
use tracing::{error, info};

use crate::jobs::MailJob;

/// Context for the mail worker.
#[derive(Clone)]
pub struct MailWorkerContext {
    /// Transport that actually sends, usually SMTP.
    pub mailer: SharedMailer,
}

impl MailWorkerContext {
    /// Create a new mail worker context.
    #[must_use]
    pub fn new(mailer: SharedMailer) -> Self {
        Self { mailer }
    }
}

/// Worker function for sending queued mails.
///
/// # Errors
/// Returns an error if the transport refuses the message, so apalis retries it.
pub async fn mail_worker(job: MailJob, ctx: Data<MailWorkerContext>) -> Result<(), Error> {
    let waited = (Utc::now() - job.queued_at).num_seconds();
    let to = job.mail.to.clone();

    match ctx.mailer.deliver(job.mail).await {
        Ok(()) => {
            info!(to = %to, waited_secs = waited, "Queued mail sent");
            Ok(())
        }
        Err(e) => {
            error!(to = %to, error = %e, "Failed to send queued mail");
            let err: Box<dyn std::error::Error + Send + Sync> = Box::new(e);
            Err(Error::Failed(Arc::new(err)))
        }
    }
}
