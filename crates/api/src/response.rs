//! API response types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Success envelope. Errors use the same shape via `AppError`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub code: u16,
    pub reason: &'static str,
    pub msg: String,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a success response.
    pub fn ok(data: T) -> Self {
        Self {
            code: StatusCode::OK.as_u16(),
            reason: "success",
            msg: String::new(),
            data,
        }
    }
}

impl ApiResponse<()> {
    /// Success without a payload; `data` is `null`.
    #[must_use]
    pub fn empty() -> Self {
        Self::ok(())
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}
