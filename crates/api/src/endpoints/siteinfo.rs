//! Public site settings.

use agora_common::AppResult;
use agora_core::SiteInfoResponse;
use axum::{Router, extract::State, routing::get};

use crate::{middleware::AppState, response::ApiResponse};

pub fn router() -> Router<AppState> {
    Router::new().route("/siteinfo", get(siteinfo))
}

async fn siteinfo(State(state): State<AppState>) -> AppResult<ApiResponse<SiteInfoResponse>> {
    let info = state.site_info_service.public_info().await?;
    Ok(ApiResponse::ok(info))
}
