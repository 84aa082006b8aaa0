//! S3 implementation of [`ObjectBackend`] on top of `aws-sdk-s3`.
//!
//! One client and one bucket name, both fixed at startup. Every call is a
//! single SDK request; retries are whatever the SDK's standard retry policy
//! does on its own.

use crate::{
    config::S3Config,
    models::object::ObjectSummary,
    services::object_backend::{
        ListObjectsPage, ListObjectsParams, MAX_KEYS_PER_PAGE, ObjectBackend, StorageError,
        StorageResult,
    },
};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::{
    Client,
    config::Credentials,
    error::DisplayErrorContext,
    primitives::{ByteStream, DateTime as S3DateTime},
    types::Object,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::time::Instant;
use tracing::{debug, error, info};

#[derive(Clone)]
pub struct S3Backend {
    client: Client,
    bucket: String,
}

impl S3Backend {
    /// Build a client from the resolved configuration.
    ///
    /// Static credentials are used when configured, otherwise the default AWS
    /// provider chain (env, profile, IMDS, ...). A custom endpoint switches to
    /// path-style addressing, which MinIO and most S3 clones require.
    pub async fn new(cfg: &S3Config) -> StorageResult<Self> {
        if cfg.bucket.trim().is_empty() {
            return Err(StorageError::Config("bucket name is empty".into()));
        }

        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &cfg.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(creds) = &cfg.credentials {
            loader = loader.credentials_provider(Credentials::new(
                creds.access_key_id.clone(),
                creds.secret_access_key.clone(),
                None,
                None,
                "object-gateway-config",
            ));
        }
        let sdk_config = loader.load().await;
        if sdk_config.region().is_none() {
            return Err(StorageError::Config(
                "no region configured; set AWS_REGION or --region".into(),
            ));
        }

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        if let Some(endpoint) = &cfg.endpoint_url {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Ok(Self::from_client(
            Client::from_conf(builder.build()),
            cfg.bucket.clone(),
        ))
    }

    pub fn from_client(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl ObjectBackend for S3Backend {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put_object(
        &self,
        key: &str,
        body: Bytes,
        content_type: Option<&str>,
    ) -> StorageResult<()> {
        let size = body.len();
        let start = Instant::now();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .set_content_type(content_type.map(str::to_owned))
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| {
                error!(
                    error = %DisplayErrorContext(&e),
                    bucket = %self.bucket,
                    key = %key,
                    size_bytes = size,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 put_object failed"
                );
                StorageError::UploadFailed {
                    key: key.to_string(),
                    reason: e.to_string(),
                }
            })?;

        info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 put_object successful"
        );
        Ok(())
    }

    async fn list_objects(&self, params: &ListObjectsParams) -> StorageResult<ListObjectsPage> {
        let start = Instant::now();
        let max_keys = params.max_keys.clamp(1, MAX_KEYS_PER_PAGE);

        let output = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .set_prefix(params.prefix.clone())
            .set_continuation_token(params.continuation_token.clone())
            .max_keys(max_keys as i32)
            .send()
            .await
            .map_err(|e| {
                error!(
                    error = %DisplayErrorContext(&e),
                    bucket = %self.bucket,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 list_objects_v2 failed"
                );
                StorageError::ListFailed {
                    bucket: self.bucket.clone(),
                    reason: e.to_string(),
                }
            })?;

        let objects: Vec<ObjectSummary> = output.contents().iter().map(summarize).collect();
        let next_continuation_token = if output.is_truncated().unwrap_or(false) {
            output.next_continuation_token().map(str::to_owned)
        } else {
            None
        };

        debug!(
            bucket = %self.bucket,
            count = objects.len(),
            truncated = next_continuation_token.is_some(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 list_objects_v2 page"
        );

        Ok(ListObjectsPage {
            objects,
            next_continuation_token,
        })
    }

    async fn delete_object(&self, key: &str) -> StorageResult<()> {
        let start = Instant::now();

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                error!(
                    error = %DisplayErrorContext(&e),
                    bucket = %self.bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 delete_object failed"
                );
                StorageError::DeleteFailed {
                    key: key.to_string(),
                    reason: e.to_string(),
                }
            })?;

        info!(
            bucket = %self.bucket,
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 delete_object successful"
        );
        Ok(())
    }
}

fn summarize(object: &Object) -> ObjectSummary {
    ObjectSummary {
        key: object.key().map(str::to_owned),
        last_modified: object.last_modified().and_then(to_utc),
        size: object.size(),
    }
}

fn to_utc(value: &S3DateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(value.secs(), value.subsec_nanos())
}
