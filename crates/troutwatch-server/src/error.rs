//! Error types for the dashboard HTTP API.
//!
//! [`ServerApiError`] covers the JSON endpoints and converts into an Axum
//! response via its [`IntoResponse`](axum::response::IntoResponse)
//! implementation. `/run` and `/data.txt` keep their own response shapes
//! and do not go through it.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Errors that can occur in the dashboard API layer.
#[derive(Debug, thiserror::Error)]
pub enum ServerApiError {
    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request body was well-formed JSON but not acceptable.
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl IntoResponse for ServerApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
