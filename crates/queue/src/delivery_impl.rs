//! Redis-backed mail delivery.
//!
//! Implements `MailDelivery` by queueing jobs for the apalis mail worker.

use agora_common::{AppError, AppResult};
use agora_core::{MailDelivery, OutgoingMail};
use apalis::prelude::*;
use async_trait::async_trait;
use tracing::debug;

use crate::jobs::MailJob;

/// Redis-backed mail queue.
#[derive(Clone)]
pub struct RedisMailQueue {
    /// Redis storage for the job queue (apalis-redis).
    storage: apalis_redis::RedisStorage<MailJob>,
}

impl RedisMailQueue {
    /// Create a new Redis mail queue.
    #[must_use]
    pub const fn new(storage: apalis_redis::RedisStorage<MailJob>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl MailDelivery for RedisMailQueue {
    async fn deliver(&self, mail: OutgoingMail) -> AppResult<()> {
        let to = mail.to.clone();
        self.storage
            .clone()
            .push(MailJob::new(mail))
            .await
            .map_err(|e| AppError::Queue(format!("Failed to queue mail: {e}")))?;

        debug!(to = %to, "Queued mail job");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn redis_url() -> String {
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string())
    }

    #[test]
    fn test_queue_is_shareable() {
        fn assert_send_sync<T: Send + Sync + Clone>() {}
        assert_send_sync::<RedisMailQueue>();
    }

    /// Run with: `cargo test -p agora-queue -- --ignored`
    #[tokio::test]
    #[ignore = "requires running Redis instance"]
    async fn test_deliver_pushes_job() {
        let client = redis::Client::open(redis_url()).unwrap();
        let conn = redis::aio::ConnectionManager::new(client).await.unwrap();
        let storage = apalis_redis::RedisStorage::<MailJob>::new(conn);
        let queue = RedisMailQueue::new(storage);

        queue
            .deliver(OutgoingMail {
                to: "a@example.com".to_string(),
                subject: "s".to_string(),
                body: "b".to_string(),
            })
            .await
            .unwrap();
    }
}
