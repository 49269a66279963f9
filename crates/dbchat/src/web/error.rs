use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use dbchat_sql::ConnectionError;
use serde_json::json;
use thiserror::Error;

/// A failed API request, rendered as `{"error": {"code", "message"}}`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No session has the given id.
    #[error("session {0} not found")]
    SessionNotFound(String),

    /// The request itself is malformed.
    #[error("{0}")]
    BadRequest(String),

    /// The database cannot be reached; the chat cannot start.
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// The server failed to finish the request.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Returns the HTTP status of this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Connection(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::SessionNotFound(_) => "SESSION_NOT_FOUND",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Connection(_) => "DATABASE_UNAVAILABLE",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": {
                "code": self.code(),
                "message": self.to_string(),
            }
        });
        (self.status(), Json(body)).into_response()
    }
}
