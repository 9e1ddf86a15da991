//! Job workers.

mod mail;

pub use mail::{MailWorkerContext, mail_worker};
