//! Storage-facing services: the backend seam and its implementations, local
//! upload staging, and the gateway operations built on top of them.

pub mod gateway_service;
pub mod memory_backend;
pub mod object_backend;
pub mod s3_backend;
pub mod staging;
