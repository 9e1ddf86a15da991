//! Durable mail queue for agora.
//!
//! When `email.delivery = "redis"`, rendered notification mails are pushed
//! to an apalis Redis queue instead of being sent from the in-process
//! notification worker:
//!
//! - **Jobs**: [`MailJob`], one rendered message
//! - **Workers**: [`mail_worker`] sends a job over the configured mailer
//! - **Producer**: [`RedisMailQueue`] implements `MailDelivery` by pushing jobs

pub mod delivery_impl;
pub mod jobs;
pub mod workers;

pub use delivery_impl::RedisMailQueue;
pub use jobs::*;
pub use workers::*;
