//! Question endpoints.

use agora_common::AppResult;
use agora_core::{NewQuestion, QuestionDetail, QuestionOperation};
use agora_db::entities::question;
use axum::{
    Router,
    extract::State,
    routing::{get, post, put},
};
use serde::Deserialize;
use validator::Validate;

use super::ObjectId;
use crate::{
    extractors::{AuthCaller, Caller, Params, ValidatedJson},
    middleware::AppState,
    response::ApiResponse,
};

#[derive(Debug, Deserialize)]
struct InfoQuery {
    id: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum StatusChange {
    Closed,
    Open,
}

#[derive(Debug, Deserialize, Validate)]
struct StatusRequest {
    #[validate(length(min = 1))]
    id: String,
    status: StatusChange,
    #[validate(length(max = 500))]
    #[serde(default)]
    close_msg: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
struct OperationRequest {
    #[validate(length(min = 1))]
    id: String,
    operation: QuestionOperation,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create).delete(remove))
        .route("/info", get(info))
        .route("/status", put(status))
        .route("/operation", put(operation))
}

async fn info(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    Params(query): Params<InfoQuery>,
) -> AppResult<ApiResponse<QuestionDetail>> {
    let detail = state.question_service.get(&ctx, &query.id).await?;
    Ok(ApiResponse::ok(detail))
}

async fn create(
    State(state): State<AppState>,
    AuthCaller(ctx): AuthCaller,
    ValidatedJson(input): ValidatedJson<NewQuestion>,
) -> AppResult<ApiResponse<question::Model>> {
    let question = state.question_service.create(&ctx, input).await?;
    Ok(ApiResponse::ok(question))
}

async fn status(
    State(state): State<AppState>,
    AuthCaller(ctx): AuthCaller,
    ValidatedJson(req): ValidatedJson<StatusRequest>,
) -> AppResult<ApiResponse<()>> {
    match req.status {
        StatusChange::Closed => state.question_service.close_as(&ctx, &req.id, req.close_msg).await?,
        StatusChange::Open => state.question_service.reopen_as(&ctx, &req.id).await?,
    }
    Ok(ApiResponse::empty())
}

async fn operation(
    State(state): State<AppState>,
    AuthCaller(ctx): AuthCaller,
    ValidatedJson(req): ValidatedJson<OperationRequest>,
) -> AppResult<ApiResponse<()>> {
    state
        .question_service
        .operate_as(&ctx, &req.id, req.operation)
        .await?;
    Ok(ApiResponse::empty())
}

async fn remove(
    State(state): State<AppState>,
    AuthCaller(ctx): AuthCaller,
    ValidatedJson(req): ValidatedJson<ObjectId>,
) -> AppResult<ApiResponse<()>> {
    state.question_service.remove_as(&ctx, &req.id).await?;
    Ok(ApiResponse::empty())
}
