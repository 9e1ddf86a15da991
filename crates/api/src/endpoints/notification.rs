//! Notification settings and inbox endpoints.

use agora_common::AppResult;
use agora_core::SourceSetting;
use agora_db::entities::notification;
use axum::{
    Router,
    extract::State,
    routing::{get, put},
};
use serde::Deserialize;
use validator::Validate;

use crate::{
    extractors::{AuthCaller, Params, ValidatedJson},
    middleware::AppState,
    response::ApiResponse,
};

const DEFAULT_INBOX_PAGE: u64 = 20;

#[derive(Debug, Deserialize, Validate)]
struct UpdateConfigRequest {
    #[validate(length(min = 1))]
    items: Vec<SourceSetting>,
}

#[derive(Debug, Deserialize, Validate)]
struct UnsubscribeRequest {
    #[validate(length(min = 1))]
    code: String,
}

#[derive(Debug, Deserialize)]
struct InboxQuery {
    limit: Option<u64>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/config", get(get_config).put(update_config))
        .route("/unsubscribe", put(unsubscribe))
        .route("/inbox", get(inbox))
}

async fn get_config(
    State(state): State<AppState>,
    AuthCaller(ctx): AuthCaller,
) -> AppResult<ApiResponse<Vec<SourceSetting>>> {
    let settings = state
        .subscription_service
        .get_config(ctx.require_user()?)
        .await?;
    Ok(ApiResponse::ok(settings))
}

async fn update_config(
    State(state): State<AppState>,
    AuthCaller(ctx): AuthCaller,
    ValidatedJson(req): ValidatedJson<UpdateConfigRequest>,
) -> AppResult<ApiResponse<Vec<SourceSetting>>> {
    let settings = state
        .subscription_service
        .update_config(ctx.require_user()?, req.items)
        .await?;
    Ok(ApiResponse::ok(settings))
}

/// Reached from mail links, so no session is needed.
async fn unsubscribe(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<UnsubscribeRequest>,
) -> AppResult<ApiResponse<()>> {
    state.subscription_service.unsubscribe(&req.code).await?;
    Ok(ApiResponse::empty())
}

async fn inbox(
    State(state): State<AppState>,
    AuthCaller(ctx): AuthCaller,
    Params(query): Params<InboxQuery>,
) -> AppResult<ApiResponse<Vec<notification::Model>>> {
    let rows = state
        .inbox_service
        .list(ctx.require_user()?, query.limit.unwrap_or(DEFAULT_INBOX_PAGE))
        .await?;
    Ok(ApiResponse::ok(rows))
}
