//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps schema validation outcomes to HTTP status codes and returns JSON
//! bodies with an error code, message, and (for client errors) details.
//!
//! A rejected path, query or body value becomes a 400 whose `details` is
//! the violation report keyed by channel. A rejected *response* is a server
//! bug: it is logged and surfaced as a 500 without the report.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use gate_core::Channel;
use gate_schema::{SessionError, ViolationReport};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "VALIDATION_ERROR", "NOT_READY").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Violation report keyed by channel, present only for validation errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// A request value failed schema validation (400).
    #[error("{} validation failed", .0.channel)]
    Rejected(ViolationReport),

    /// The schema store has not been installed yet (503).
    #[error("schema validation is not ready")]
    NotReady,

    /// The request could not be parsed at all (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Rejected(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            Self::NotReady => (StatusCode::SERVICE_UNAVAILABLE, "NOT_READY"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        if matches!(&self, Self::Internal(_)) {
            tracing::error!(error = %self, "internal server error");
        }

        let details = match &self {
            Self::Rejected(report) => serde_json::to_value(report).ok().map(|value| {
                let mut keyed = serde_json::Map::new();
                keyed.insert(report.channel.to_string(), value);
                serde_json::Value::Object(keyed)
            }),
            _ => None,
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Request-channel rejections are client errors; response rejections and
/// compile errors are server errors.
impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Rejected(report) if report.channel == Channel::Response => {
                Self::Internal(report.to_string())
            }
            SessionError::Rejected(report) => Self::Rejected(report),
            SessionError::Compile(e) => Self::Internal(format!("validator compilation failed: {e}")),
        }
    }
}
