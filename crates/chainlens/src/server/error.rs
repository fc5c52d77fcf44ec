use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use chainlens_core::CoreError;

// ==============================================================================
// Error Type
// ==============================================================================

#[derive(Debug)]
pub(crate) enum AppError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

/// Map a service failure onto its HTTP class. Everything that is not the
/// caller's fault or a plain absence is a 500 carrying the cause.
pub(super) fn map_core_error(context: &str, err: CoreError) -> AppError {
    match err {
        CoreError::InvalidArgument(message) => AppError::BadRequest(message),
        CoreError::NotFound(message) => AppError::NotFound(message),
        other => {
            tracing::error!(error = %other, "{context} failed");
            AppError::Internal(other.to_string())
        }
    }
}
