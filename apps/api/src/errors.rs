use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::nesting::allocator::{AllocationError, PackingErrorKind};
use crate::nesting::shapes::ShapeError;
use crate::nesting::sheet::TemplateError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    /// A shape document cannot be read or measured.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// The shapes can never be nested onto sheets of the requested size.
    #[error("Unsatisfiable: {0}")]
    Unsatisfiable(PackingErrorKind),

    #[error("Packing timed out: {0}")]
    Timeout(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<TemplateError> for AppError {
    fn from(err: TemplateError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<ShapeError> for AppError {
    fn from(err: ShapeError) -> Self {
        AppError::MalformedInput(err.to_string())
    }
}

impl From<AllocationError> for AppError {
    fn from(err: AllocationError) -> Self {
        match err {
            AllocationError::MalformedInput(msg) => AppError::MalformedInput(msg),
            AllocationError::Timeout { .. } => AppError::Timeout(err.to_string()),
            other => AppError::Internal(anyhow::Error::new(other)),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::MalformedInput(msg) => {
                (StatusCode::BAD_REQUEST, "MALFORMED_INPUT", msg.clone())
            }
            AppError::Unsatisfiable(kind) => {
                (StatusCode::BAD_REQUEST, kind.code(), kind.message().to_string())
            }
            AppError::Timeout(msg) => {
                tracing::warn!("Packing timeout: {msg}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "PACK_TIMEOUT",
                    "Packing did not finish within the allotted time".to_string(),
                )
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

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
