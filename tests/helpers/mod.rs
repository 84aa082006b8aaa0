//! Shared setup for HTTP-level tests: the real router over an in-memory
//! backend and a throwaway staging directory.

#![allow(dead_code)]

use axum_test::{
    TestServer,
    multipart::{MultipartForm, Part},
};
use object_gateway::{
    routes::routes,
    services::{
        gateway_service::GatewayService, memory_backend::InMemoryBackend, staging::StagingArea,
    },
};
use std::{path::Path, sync::Arc};
use tempfile::TempDir;

pub struct TestApp {
    pub server: TestServer,
    pub backend: Arc<InMemoryBackend>,
    pub staging_dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_limit(None).await
    }

    pub async fn with_limit(max_upload_bytes: Option<usize>) -> Self {
        let staging_dir = tempfile::tempdir().expect("create staging dir");
        let staging = StagingArea::new(staging_dir.path());
        staging.prepare().await.expect("prepare staging dir");

        let backend = Arc::new(InMemoryBackend::new("test-bucket"));
        let service = GatewayService::new(backend.clone(), staging);
        let server =
            TestServer::new(routes::app(service, max_upload_bytes)).expect("start test server");

        Self {
            server,
            backend,
            staging_dir,
        }
    }

    pub fn staging_path(&self) -> &Path {
        self.staging_dir.path()
    }

    /// Number of files currently sitting in the staging directory.
    pub fn staged_files(&self) -> usize {
        std::fs::read_dir(self.staging_path())
            .expect("read staging dir")
            .count()
    }
}

pub fn file_form(name: &str, body: &'static [u8]) -> MultipartForm {
    let part = Part::bytes(body).file_name(name.to_string()).mime_type("text/plain");
    MultipartForm::new().add_part("file", part)
}
