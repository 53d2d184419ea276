//! API error types and JSON error response formatting.
//!
//! Every error the proxy produces itself is rendered as `{"error": "..."}`.
//! Upstream error responses are relayed untouched and never pass through here.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// JSON error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Human-readable error message.
    pub error: String,
    /// Optional structured details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Errors raised by the proxy itself.
#[derive(Debug)]
pub enum ApiError {
    /// 400 Bad Request - the client sent a body that is not JSON.
    BadRequest(String),
    /// 500 Internal Server Error - the upstream could not be reached or read.
    Upstream(String),
    /// 500 Internal Server Error - unexpected proxy failure.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Upstream(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = ErrorBody {
            error: message,
            details: None,
        };

        (status, Json(body)).into_response()
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Upstream(err.to_string())
    }
}

impl From<finch_core::error::FinchError> for ApiError {
    fn from(err: finch_core::error::FinchError) -> Self {
        ApiError::Internal(err.to_string())
    }
}
