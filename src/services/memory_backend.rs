//! In-process [`ObjectBackend`] for local runs (`--in-memory`) and tests.
//!
//! Objects live in a `BTreeMap` so listings come back in lexicographic key
//! order, the same order S3 uses. Paging follows ListObjectsV2: a page holds
//! at most `max_keys` entries and the continuation token is the last key
//! returned. Call counters and a failure switch make it usable as a test
//! double.

use crate::{
    models::object::ObjectSummary,
    services::object_backend::{
        ListObjectsPage, ListObjectsParams, MAX_KEYS_PER_PAGE, ObjectBackend, StorageError,
        StorageResult,
    },
};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::{
    collections::BTreeMap,
    ops::Bound,
    sync::{
        RwLock,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};
use tracing::debug;

#[derive(Clone, Debug)]
pub struct StoredObject {
    pub body: Bytes,
    pub content_type: Option<String>,
    pub last_modified: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct InMemoryBackend {
    bucket: String,
    objects: RwLock<BTreeMap<String, StoredObject>>,
    failing: AtomicBool,
    put_calls: AtomicUsize,
    list_calls: AtomicUsize,
    delete_calls: AtomicUsize,
}

impl InMemoryBackend {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            ..Self::default()
        }
    }

    /// While set, every operation fails without touching stored objects.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn put_calls(&self) -> usize {
        self.put_calls.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    /// Total number of backend operations attempted.
    pub fn total_calls(&self) -> usize {
        self.put_calls() + self.list_calls() + self.delete_calls()
    }

    pub fn get(&self, key: &str) -> Option<StoredObject> {
        self.read_objects().get(key).cloned()
    }

    fn is_failing(&self) -> bool {
        self.failing.load(Ordering::SeqCst)
    }

    fn read_objects(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<String, StoredObject>> {
        self.objects.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_objects(&self) -> std::sync::RwLockWriteGuard<'_, BTreeMap<String, StoredObject>> {
        self.objects
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ObjectBackend for InMemoryBackend {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put_object(
        &self,
        key: &str,
        body: Bytes,
        content_type: Option<&str>,
    ) -> StorageResult<()> {
        self.put_calls.fetch_add(1, Ordering::SeqCst);
        if self.is_failing() {
            return Err(StorageError::UploadFailed {
                key: key.to_string(),
                reason: "backend unavailable".into(),
            });
        }

        let size = body.len();
        self.write_objects().insert(
            key.to_string(),
            StoredObject {
                body,
                content_type: content_type.map(str::to_owned),
                last_modified: Utc::now(),
            },
        );
        debug!(bucket = %self.bucket, key = %key, size_bytes = size, "stored object in memory");
        Ok(())
    }

    async fn list_objects(&self, params: &ListObjectsParams) -> StorageResult<ListObjectsPage> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.is_failing() {
            return Err(StorageError::ListFailed {
                bucket: self.bucket.clone(),
                reason: "backend unavailable".into(),
            });
        }

        let max_keys = params.max_keys.clamp(1, MAX_KEYS_PER_PAGE);
        let fetch_limit = max_keys + 1;
        let lower = match &params.continuation_token {
            Some(token) => Bound::Excluded(token.clone()),
            None => Bound::Unbounded,
        };

        let objects = self.read_objects();
        let mut rows: Vec<(&String, &StoredObject)> = objects
            .range((lower, Bound::Unbounded))
            .filter(|(key, _)| match &params.prefix {
                Some(prefix) => key.starts_with(prefix.as_str()),
                None => true,
            })
            .take(fetch_limit)
            .collect();

        let mut next_continuation_token = None;
        if rows.len() == fetch_limit {
            rows.pop();
            next_continuation_token = rows.last().map(|(key, _)| key.to_string());
        }

        let objects = rows
            .into_iter()
            .map(|(key, object)| ObjectSummary {
                key: Some(key.clone()),
                last_modified: Some(object.last_modified),
                size: Some(object.body.len() as i64),
            })
            .collect();

        Ok(ListObjectsPage {
            objects,
            next_continuation_token,
        })
    }

    async fn delete_object(&self, key: &str) -> StorageResult<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if self.is_failing() {
            return Err(StorageError::DeleteFailed {
                key: key.to_string(),
                reason: "backend unavailable".into(),
            });
        }

        let removed = self.write_objects().remove(key).is_some();
        debug!(bucket = %self.bucket, key = %key, removed, "deleted object from memory");
        Ok(())
    }
}
