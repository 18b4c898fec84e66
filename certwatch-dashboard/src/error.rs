//! Error handling

use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
    Json,
};
use serde_json::json;

use certwatch_core::{PipelineError, ValidationError, Violation};

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    // Payload errors
    Validation { message: String, violations: Vec<Violation> },
    MalformedRecord(String),

    // Generic errors
    InternalError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Validation { message, violations } => {
                tracing::warn!("Rejected payload: {}", message);
                let status = StatusCode::BAD_REQUEST;
                (status, json!({
                    "error": message,
                    "status": status.as_u16(),
                    "violations": violations,
                }))
            }
            AppError::MalformedRecord(msg) => {
                tracing::warn!("Malformed run: {}", msg);
                let status = StatusCode::UNPROCESSABLE_ENTITY;
                (status, json!({ "error": msg, "status": status.as_u16() }))
            }
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                let status = StatusCode::INTERNAL_SERVER_ERROR;
                (status, json!({ "error": "Internal server error", "status": status.as_u16() }))
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Malformed(e) => AppError::MalformedRecord(e.to_string()),
            PipelineError::Validation(e) => AppError::Validation {
                message: format!("{} failed schema validation", e.kind),
                violations: e.violations,
            },
            other => AppError::InternalError(other.to_string()),
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        PipelineError::from(err).into()
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::InternalError(err.to_string())
    }
}
