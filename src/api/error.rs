use crate::error::AppError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Failure of a materialized-backup call. Every core error becomes a 500
/// carrying the operation context and the error text.
#[derive(Debug)]
pub struct ApiError {
    context: &'static str,
    source: AppError,
}

impl ApiError {
    pub fn new(context: &'static str, source: AppError) -> Self {
        Self { context, source }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self.source {
            AppError::Unavailable(e) => tracing::error!("Store error: {}", e),
            AppError::Io(e) => tracing::error!("IO error: {}", e),
            other => tracing::debug!("{}: {}", self.context, other),
        }

        let body = json!({
            "message": format!("{}. err={}", self.context, self.source)
        });

        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
