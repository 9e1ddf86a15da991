//! Common utilities and shared types for agora.
//!
//! This crate provides foundational components used across all agora crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: kind-prefixed ULID identifiers via [`IdGenerator`]
//! - **Cache**: key/value cache with TTL via the [`Cache`] trait, backed by
//!   Redis ([`RedisCache`]) or process memory ([`MemoryCache`])
//!
//! # Example
//!
//! ```no_run
//! use agora_common::{AppResult, Config, IdGenerator, ObjectKind};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     let id = id_gen.generate_for(ObjectKind::Question);
//!     assert_eq!(ObjectKind::from_object_id(&id), Some(ObjectKind::Question));
//!     println!("listening on {}:{}", config.server.host, config.server.port);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod id;

pub use cache::{Cache, MemoryCache, RedisCache, SharedCache};
pub use config::Config;
pub use error::{AppError, AppResult, FieldError, ForbiddenKind};
pub use id::{IdGenerator, ObjectKind};
