//! Vote endpoints.

use agora_common::AppResult;
use agora_core::{RequestContext, VoteDirection, VoteResult};
use axum::{Router, extract::State, routing::post};
use serde::Deserialize;
use validator::Validate;

use crate::{
    extractors::{AuthCaller, ValidatedJson},
    middleware::AppState,
    response::ApiResponse,
};

#[derive(Debug, Deserialize, Validate)]
struct VoteRequest {
    #[validate(length(min = 1))]
    object_id: String,
    /// Withdraw the vote instead of casting it.
    #[serde(default)]
    is_cancel: bool,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/up", post(up))
        .route("/down", post(down))
}

async fn apply(
    state: &AppState,
    ctx: &RequestContext,
    req: &VoteRequest,
    direction: VoteDirection,
) -> AppResult<VoteResult> {
    if req.is_cancel {
        state.vote_service.undo_vote(ctx, &req.object_id, direction).await
    } else {
        state.vote_service.vote(ctx, &req.object_id, direction).await
    }
}

async fn up(
    State(state): State<AppState>,
    AuthCaller(ctx): AuthCaller,
    ValidatedJson(req): ValidatedJson<VoteRequest>,
) -> AppResult<ApiResponse<VoteResult>> {
    let result = apply(&state, &ctx, &req, VoteDirection::Up).await?;
    Ok(ApiResponse::ok(result))
}

async fn down(
    State(state): State<AppState>,
    AuthCaller(ctx): AuthCaller,
    ValidatedJson(req): ValidatedJson<VoteRequest>,
) -> AppResult<ApiResponse<VoteResult>> {
    let result = apply(&state, &ctx, &req, VoteDirection::Down).await?;
    Ok(ApiResponse::ok(result))
}
