//! The storage seam between HTTP handlers and the remote object store.
//!
//! Handlers never talk to a concrete client. They go through
//! `Arc<dyn ObjectBackend>`, so S3 and the in-process store are swappable.

use crate::models::object::ObjectSummary;
use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Largest page a single list call may return, mirroring S3 `max-keys`.
pub const MAX_KEYS_PER_PAGE: usize = 1000;

#[derive(Clone, Debug)]
pub struct ListObjectsParams {
    pub prefix: Option<String>,
    pub continuation_token: Option<String>,
    pub max_keys: usize,
}

impl Default for ListObjectsParams {
    fn default() -> Self {
        Self {
            prefix: None,
            continuation_token: None,
            max_keys: MAX_KEYS_PER_PAGE,
        }
    }
}

/// One page of a listing. `next_continuation_token` is set while more remain.
#[derive(Debug, Default)]
pub struct ListObjectsPage {
    pub objects: Vec<ObjectSummary>,
    pub next_continuation_token: Option<String>,
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("upload of `{key}` failed: {reason}")]
    UploadFailed { key: String, reason: String },
    #[error("listing bucket `{bucket}` failed: {reason}")]
    ListFailed { bucket: String, reason: String },
    #[error("delete of `{key}` failed: {reason}")]
    DeleteFailed { key: String, reason: String },
    #[error("storage configuration error: {0}")]
    Config(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

#[async_trait]
pub trait ObjectBackend: Send + Sync {
    /// Bucket every operation targets.
    fn bucket(&self) -> &str;

    /// Store `body` under `key`, replacing any existing object.
    async fn put_object(
        &self,
        key: &str,
        body: Bytes,
        content_type: Option<&str>,
    ) -> StorageResult<()>;

    /// Fetch a single page of the bucket listing.
    async fn list_objects(&self, params: &ListObjectsParams) -> StorageResult<ListObjectsPage>;

    /// Remove `key`. Removing an absent key is not an error.
    async fn delete_object(&self, key: &str) -> StorageResult<()>;
}
