use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::extract::ExtractError;
use crate::remote::RemoteError;
use crate::schema::ValidationError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Remote service error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Load failed: {0}")]
    LoadFailed(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ExtractError> for AppError {
    fn from(e: ExtractError) -> Self {
        match e {
            ExtractError::UnsupportedFormat(mt) => AppError::UnsupportedFormat(mt),
            ExtractError::Malformed(msg) => AppError::MalformedDocument(msg),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::UnsupportedFormat(mt) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "UNSUPPORTED_FORMAT",
                format!("Unsupported media type: {mt}"),
            ),
            AppError::MalformedDocument(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "MALFORMED_DOCUMENT",
                msg.clone(),
            ),
            AppError::Validation(e) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string())
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::Remote(e) => {
                tracing::error!("Remote resume service error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "REMOTE_SERVICE_ERROR",
                    e.to_string(),
                )
            }
            AppError::LoadFailed(msg) => {
                tracing::error!("Initial document load failed: {msg}");
                (StatusCode::BAD_GATEWAY, "LOAD_FAILED", msg.clone())
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        // Validation failures carry the full per-field violation set.
        let body = match &self {
            AppError::Validation(e) => Json(json!({
                "error": {
                    "code": code,
                    "message": message,
                    "violations": e.violations,
                }
            })),
            _ => Json(json!({
                "error": {
                    "code": code,
                    "message": message,
                }
            })),
        };

        (status, body).into_response()
    }
}
