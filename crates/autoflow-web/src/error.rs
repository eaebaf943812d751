//! API error responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// An error rendered as `{ "error": message }` with a matching status.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request is unusable as sent.
    #[error("{0}")]
    BadRequest(String),

    /// Account storage failed.
    #[error("storage error: {0}")]
    Store(#[from] autoflow_store::StoreError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Convenience alias for handler results.
pub type Result<T> = std::result::Result<T, ApiError>;
