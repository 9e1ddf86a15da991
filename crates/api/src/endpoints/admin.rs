//! Admin endpoints. Every route requires an admin or moderator.

use agora_common::{AppError, AppResult};
use agora_core::{DashboardInfo, ReasonOption, ReportPage};
use agora_db::{
    entities::{
        report::{self, FlaggedType, ReportStatus},
        site_info::SiteInfoType,
    },
    repositories::ReportFilter,
};
use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    routing::{get, put},
};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;
use validator::Validate;

use super::report::ReasonsQuery;
use crate::{
    extractors::{AdminCaller, Params, ValidatedJson},
    middleware::AppState,
    response::ApiResponse,
};

const DEFAULT_PAGE_SIZE: u64 = 20;

#[derive(Debug, Deserialize)]
struct ReportPageQuery {
    status: Option<ReportStatus>,
    object_type: Option<String>,
    page: Option<u64>,
    page_size: Option<u64>,
}

#[derive(Debug, Deserialize, Validate)]
struct HandleReportRequest {
    #[validate(length(min = 1))]
    id: String,
    flagged_type: FlaggedType,
    #[validate(length(max = 500))]
    #[serde(default)]
    flagged_content: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/reports/page", get(reports_page))
        .route("/report", put(handle_report))
        .route("/reasons", get(flag_reasons))
        .route("/siteinfo/{site_type}", get(get_siteinfo).put(save_siteinfo))
        .route("/dashboard", get(dashboard))
}

fn site_type(name: &str) -> AppResult<SiteInfoType> {
    SiteInfoType::parse(name).ok_or_else(|| AppError::NotFound(format!("site info type {name}")))
}

async fn reports_page(
    State(state): State<AppState>,
    AdminCaller(_ctx): AdminCaller,
    Params(query): Params<ReportPageQuery>,
) -> AppResult<ApiResponse<ReportPage>> {
    let filter = ReportFilter {
        status: query.status,
        object_type: query.object_type,
    };
    let page = state
        .report_service
        .list_reports(
            &filter,
            query.page.unwrap_or(1),
            query.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        )
        .await?;
    Ok(ApiResponse::ok(page))
}

async fn handle_report(
    State(state): State<AppState>,
    AdminCaller(ctx): AdminCaller,
    ValidatedJson(req): ValidatedJson<HandleReportRequest>,
) -> AppResult<ApiResponse<report::Model>> {
    let report = state
        .report_service
        .handle_report(&req.id, req.flagged_type, req.flagged_content)
        .await?;
    info!(
        report_id = %report.id,
        moderator = ctx.user_id.as_deref().unwrap_or_default(),
        flagged_type = ?req.flagged_type,
        "Report handled"
    );
    Ok(ApiResponse::ok(report))
}

async fn flag_reasons(
    State(state): State<AppState>,
    AdminCaller(_ctx): AdminCaller,
    Params(query): Params<ReasonsQuery>,
) -> AppResult<ApiResponse<Vec<ReasonOption>>> {
    let reasons = state.report_service.flag_reasons(query.object_type).await?;
    Ok(ApiResponse::ok(reasons))
}

async fn get_siteinfo(
    State(state): State<AppState>,
    AdminCaller(_ctx): AdminCaller,
    Path(name): Path<String>,
) -> AppResult<ApiResponse<Value>> {
    let value = state.site_info_service.get_raw(site_type(&name)?).await?;
    Ok(ApiResponse::ok(value))
}

async fn save_siteinfo(
    State(state): State<AppState>,
    AdminCaller(ctx): AdminCaller,
    Path(name): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<ApiResponse<Value>> {
    let site_type = site_type(&name)?;
    let Json(value) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let saved = state
        .site_info_service
        .save_raw(site_type, value, &ctx.language)
        .await?;
    Ok(ApiResponse::ok(saved))
}

async fn dashboard(
    State(state): State<AppState>,
    AdminCaller(_ctx): AdminCaller,
) -> AppResult<ApiResponse<DashboardInfo>> {
    let info = state.dashboard_service.statistical().await?;
    Ok(ApiResponse::ok(info))
}
