//! GatewayService: the three operations the HTTP surface exposes, wired to
//! an injected [`ObjectBackend`] and a local [`StagingArea`].

use crate::{
    models::object::ObjectSummary,
    services::{
        object_backend::{ListObjectsParams, ObjectBackend, StorageError, StorageResult},
        staging::{StageError, StagedFile, StagingArea},
    },
};
use axum::extract::multipart::Field;
use std::{io, sync::Arc};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum UploadError {
    #[error(transparent)]
    Stage(#[from] StageError),
    #[error("reading staged upload failed: {0}")]
    ReadStaged(#[source] io::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Shared handler state. Cloning is cheap; everything inside is read-only.
#[derive(Clone)]
pub struct GatewayService {
    backend: Arc<dyn ObjectBackend>,
    staging: StagingArea,
}

impl GatewayService {
    pub fn new(backend: Arc<dyn ObjectBackend>, staging: StagingArea) -> Self {
        Self { backend, staging }
    }

    pub fn bucket(&self) -> &str {
        self.backend.bucket()
    }

    pub fn staging(&self) -> &StagingArea {
        &self.staging
    }

    /// Stage a multipart file field and forward it under its original filename.
    pub async fn upload_field(
        &self,
        file_name: String,
        field: Field<'_>,
    ) -> Result<UploadedFile, UploadError> {
        let staged = self.staging.stage_field(file_name, field).await?;
        self.upload_staged(staged).await
    }

    /// Forward a staged file to the backend. The staging copy is gone when this
    /// returns, whatever the outcome.
    pub async fn upload_staged(&self, staged: StagedFile) -> Result<UploadedFile, UploadError> {
        let body = staged.read().await.map_err(UploadError::ReadStaged)?;
        let result = self
            .backend
            .put_object(staged.file_name(), body, staged.content_type())
            .await;

        let upload = UploadedFile {
            key: staged.file_name().to_string(),
            size: staged.size(),
        };
        let path = staged.path().to_path_buf();
        if let Err(err) = staged.discard().await {
            warn!(path = %path.display(), error = %err, "failed to remove staging file");
        }

        result?;
        info!(bucket = %self.bucket(), key = %upload.key, size_bytes = upload.size, "file uploaded");
        Ok(upload)
    }

    /// Every object in the bucket (optionally under `prefix`), following
    /// continuation tokens until the listing is exhausted.
    pub async fn list_files(&self, prefix: Option<String>) -> StorageResult<Vec<ObjectSummary>> {
        let mut params = ListObjectsParams {
            prefix,
            ..ListObjectsParams::default()
        };
        let mut files = Vec::new();

        loop {
            let page = self.backend.list_objects(&params).await?;
            files.extend(page.objects);

            match page.next_continuation_token {
                None => break,
                Some(token) if params.continuation_token.as_ref() == Some(&token) => {
                    return Err(StorageError::ListFailed {
                        bucket: self.bucket().to_string(),
                        reason: format!("continuation token `{}` repeated", token),
                    });
                }
                Some(token) => params.continuation_token = Some(token),
            }
        }

        Ok(files)
    }

    pub async fn delete_file(&self, key: &str) -> StorageResult<()> {
        self.backend.delete_object(key).await?;
        info!(bucket = %self.bucket(), key = %key, "file deleted");
        Ok(())
    }
}

/// What was written by a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub key: String,
    pub size: u64,
}
