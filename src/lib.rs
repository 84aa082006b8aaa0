//! HTTP gateway in front of an S3-compatible bucket: upload, list and delete
//! files, plus a liveness probe.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
