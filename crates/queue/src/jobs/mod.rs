//! Job definitions.

#![allow(missing_docs)]

mod mail;

pub use mail::MailJob;
