//! Error responses for the notes API.
//!
//! Storage outcomes are absorbed here: handlers map gateway errors into
//! an `ApiError`, which renders as `{"error": "..."}` with the matching
//! status. Nothing below this boundary can fail the process.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Invalid body or duplicate title.
    BadRequest(String),
    NotFound(String),
    PayloadTooLarge(String),
    /// Delete of something already absent.
    NoContent,
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::NoContent => StatusCode::NO_CONTENT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ApiError::NoContent => status.into_response(),
            ApiError::BadRequest(message)
            | ApiError::NotFound(message)
            | ApiError::PayloadTooLarge(message)
            | ApiError::Internal(message) => {
                (status, Json(json!({ "error": message }))).into_response()
            }
        }
    }
}
