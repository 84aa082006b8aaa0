use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

pub const NO_FILE_UPLOADED: &str = "No file uploaded";
pub const INVALID_MULTIPART: &str = "Invalid multipart request";
pub const FILE_TOO_LARGE: &str = "File too large";
pub const FILE_KEY_REQUIRED: &str = "File key is required";
pub const UPLOAD_FAILED: &str = "Failed to upload file";
pub const LIST_FAILED: &str = "Failed to retrieve file";
pub const DELETE_FAILED: &str = "Failed to delete file";

/// A lightweight wrapper for request errors. The message is the only thing
/// the client sees; underlying causes are logged where they happen.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    /// Shortcut for 400 Bad Request
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.message }));

        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn renders_status_and_error_body() {
        let response = AppError::bad_request(FILE_KEY_REQUIRED).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value, json!({ "error": "File key is required" }));
    }

    #[test]
    fn internal_maps_to_500() {
        let err = AppError::internal(UPLOAD_FAILED);
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Failed to upload file");
    }
}
