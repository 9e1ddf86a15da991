//! Report endpoints.

use agora_common::{AppResult, ObjectKind};
use agora_core::{NewReport, ReasonOption};
use agora_db::entities::report;
use axum::{
    Router,
    extract::State,
    routing::{get, post},
};
use serde::Deserialize;

use crate::{
    extractors::{AuthCaller, Params, ValidatedJson},
    middleware::AppState,
    response::ApiResponse,
};

#[derive(Debug, Deserialize)]
pub(crate) struct ReasonsQuery {
    pub object_type: ObjectKind,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/report", post(create))
        .route("/reasons", get(reasons))
}

async fn create(
    State(state): State<AppState>,
    AuthCaller(ctx): AuthCaller,
    ValidatedJson(input): ValidatedJson<NewReport>,
) -> AppResult<ApiResponse<report::Model>> {
    let report = state.report_service.create_report(&ctx, input).await?;
    Ok(ApiResponse::ok(report))
}

async fn reasons(
    State(state): State<AppState>,
    Params(query): Params<ReasonsQuery>,
) -> AppResult<ApiResponse<Vec<ReasonOption>>> {
    let reasons = state.report_service.report_reasons(query.object_type).await?;
    Ok(ApiResponse::ok(reasons))
}
