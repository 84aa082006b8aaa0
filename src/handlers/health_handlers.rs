//! Liveness handlers.
//!
//! - GET /health -> `{status, timestamp}`
//! - GET /       -> `{message}`
//!
//! Neither touches the object store, so a broken storage connection is not
//! visible here.

use axum::{Json, http::StatusCode, response::IntoResponse};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok",
            timestamp: Utc::now(),
        }),
    )
}

/// `GET /`
pub async fn root() -> impl IntoResponse {
    Json(RootResponse {
        message: "Object gateway is running",
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: DateTime<Utc>,
}

#[derive(Serialize)]
struct RootResponse {
    message: &'static str,
}
