//! Error responses for the HTTP API.
//!
//! Every failure leaves the server as `{"error": <message>, "kind": <kind>}`.
//! Messages are fixed per kind; internal detail is only logged.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chirpy::AuthError;
use serde::Serialize;

/// Body of every error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: &'static str,
}

/// Failure of an API handler
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Failure reported by the session layer
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Request body missing or not the expected JSON
    #[error("Invalid request body: {0}")]
    InvalidBody(#[from] JsonRejection),
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Auth(e) => e.status_code(),
            ApiError::InvalidBody(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn to_response_body(&self) -> ErrorResponse {
        match self {
            // Which credential check failed stays in the logs.
            ApiError::Auth(e) if e.status_code() == StatusCode::UNAUTHORIZED => ErrorResponse {
                error: e.client_message(),
                kind: "unauthorized",
            },
            ApiError::Auth(e) => ErrorResponse {
                error: e.client_message(),
                kind: e.kind(),
            },
            ApiError::InvalidBody(_) => ErrorResponse {
                error: "Invalid request body".to_string(),
                kind: "invalid_body",
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        (status, Json(self.to_response_body())).into_response()
    }
}
