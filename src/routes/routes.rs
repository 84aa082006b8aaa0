//! Defines the gateway's HTTP surface.
//!
//! ## Structure
//! - `GET    /`             banner
//! - `GET    /health`       liveness with timestamp
//! - `POST   /upload`       multipart upload, field `file`
//! - `GET    /files`        list objects (supports `?prefix=`)
//! - `DELETE /files/{*key}` delete one object
//!
//! The wildcard `*key` allows nested keys like `photos/2025/img.jpg`.
//! `DELETE /files` and `DELETE /files/` carry no key and are rejected with 400.

use crate::{
    handlers::{
        file_handlers::{delete_file, delete_without_key, list_files, upload_file},
        health_handlers::{health, root},
    },
    services::gateway_service::GatewayService,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
};
use tower_http::trace::TraceLayer;

/// Build the router for all gateway routes.
///
/// The router carries shared state (`GatewayService`) to all handlers.
pub fn routes() -> Router<GatewayService> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/upload", post(upload_file))
        .route("/files", get(list_files).delete(delete_without_key))
        .route("/files/", delete(delete_without_key))
        .route("/files/{*key}", delete(delete_file))
}

/// Attach state, body limit and request tracing.
///
/// `max_upload_bytes = None` lifts axum's default body limit entirely.
pub fn app(service: GatewayService, max_upload_bytes: Option<usize>) -> Router {
    let body_limit = match max_upload_bytes {
        Some(limit) => DefaultBodyLimit::max(limit),
        None => DefaultBodyLimit::disable(),
    };

    routes()
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}
