//! Core business logic for agora.
//!
//! Services depend on the `*Store` traits of `agora-db`, never on a
//! database connection, so every workflow here can be exercised against
//! [`testing::MemoryStore`].

pub mod context;
pub mod i18n;
pub mod services;
pub mod stores;
pub mod validation;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use context::RequestContext;
pub use i18n::Translator;
pub use services::*;
pub use stores::Stores;
pub use validation::Validator;
