//! Answer endpoints.

use agora_common::AppResult;
use agora_core::NewAnswer;
use agora_db::entities::answer;
use axum::{Router, extract::State, routing::post};

use super::ObjectId;
use crate::{
    extractors::{AuthCaller, ValidatedJson},
    middleware::AppState,
    response::ApiResponse,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(create).delete(remove))
}

async fn create(
    State(state): State<AppState>,
    AuthCaller(ctx): AuthCaller,
    ValidatedJson(input): ValidatedJson<NewAnswer>,
) -> AppResult<ApiResponse<answer::Model>> {
    let answer = state.answer_service.create(&ctx, input).await?;
    Ok(ApiResponse::ok(answer))
}

async fn remove(
    State(state): State<AppState>,
    AuthCaller(ctx): AuthCaller,
    ValidatedJson(req): ValidatedJson<ObjectId>,
) -> AppResult<ApiResponse<()>> {
    state.answer_service.remove_as(&ctx, &req.id).await?;
    Ok(ApiResponse::empty())
}
