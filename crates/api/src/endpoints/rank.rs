//! Leaderboard endpoints.

use agora_common::AppResult;
use agora_core::RankEntry;
use axum::{Router, extract::State, routing::get};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use crate::{extractors::Params, middleware::AppState, response::ApiResponse};

const DEFAULT_LIMIT: u64 = 10;
const DEFAULT_WINDOW_DAYS: i64 = 7;

/// Leaderboard window; defaults to the last week.
#[derive(Debug, Deserialize)]
struct RankQuery {
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    limit: Option<u64>,
}

impl RankQuery {
    fn window(&self) -> (DateTime<Utc>, DateTime<Utc>, u64) {
        let end = self.end.unwrap_or_else(Utc::now);
        let start = self
            .start
            .unwrap_or_else(|| end - Duration::days(DEFAULT_WINDOW_DAYS));
        (start, end, self.limit.unwrap_or(DEFAULT_LIMIT))
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/gainers", get(gainers))
        .route("/voters", get(voters))
}

async fn gainers(
    State(state): State<AppState>,
    Params(query): Params<RankQuery>,
) -> AppResult<ApiResponse<Vec<RankEntry>>> {
    let (start, end, limit) = query.window();
    let rows = state.activity_service.top_gainers(start, end, limit).await?;
    Ok(ApiResponse::ok(rows))
}

async fn voters(
    State(state): State<AppState>,
    Params(query): Params<RankQuery>,
) -> AppResult<ApiResponse<Vec<RankEntry>>> {
    let (start, end, limit) = query.window();
    let rows = state.activity_service.top_voters(start, end, limit).await?;
    Ok(ApiResponse::ok(rows))
}
