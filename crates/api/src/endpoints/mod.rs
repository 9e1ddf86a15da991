//! API endpoints.

mod admin;
mod answer;
mod comment;
mod notification;
mod question;
mod rank;
mod report;
mod siteinfo;
mod vote;

use axum::Router;
use serde::Deserialize;
use validator::Validate;

use crate::middleware::AppState;

/// Body of requests that only name an object.
#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ObjectId {
    #[validate(length(min = 1))]
    pub id: String,
}

/// Create the API router, to be nested under [`crate::API_PREFIX`].
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/question", question::router())
        .nest("/answer", answer::router())
        .nest("/comment", comment::router())
        .nest("/vote", vote::router())
        .merge(report::router())
        .nest("/rank", rank::router())
        .nest("/notification", notification::router())
        .merge(siteinfo::router())
        .nest("/admin", admin::router())
}
