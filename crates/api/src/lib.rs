//! HTTP API layer for agora.
//!
//! This crate provides the JSON API served under `/answer/api/v1`:
//!
//! - **Endpoints**: questions, answers, comments, votes, reports, ranks,
//!   notification settings, site info and the admin console
//! - **Extractors**: caller context, request language, validated bodies
//! - **Middleware**: token authentication
//!
//! Built on Axum 0.8. Every response uses the `{code, reason, msg, data}`
//! envelope.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::{AppState, auth_middleware};

/// Path prefix of every API route.
pub const API_PREFIX: &str = "/answer/api/v1";
