//! HTTP handlers for uploading, listing and deleting files.
//!
//! Backend failures are logged here and collapsed into fixed error bodies;
//! the client never sees why the object store refused.

use crate::{
    errors::{
        AppError, DELETE_FAILED, FILE_KEY_REQUIRED, FILE_TOO_LARGE, INVALID_MULTIPART,
        LIST_FAILED, NO_FILE_UPLOADED, UPLOAD_FAILED,
    },
    models::object::ObjectSummary,
    services::{
        gateway_service::{GatewayService, UploadError},
        staging::StageError,
    },
};
use axum::{
    Json,
    extract::{
        Multipart, Path, Query, State,
        multipart::{MultipartError, MultipartRejection},
    },
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

/// Multipart form field carrying the upload.
pub const FILE_FIELD: &str = "file";

#[derive(Debug, Deserialize)]
pub struct ListFilesQuery {
    pub prefix: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Keys that are empty or whitespace-only are refused on upload and delete
/// alike, so anything stored through this API can also be deleted by it.
fn is_usable_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// `POST /upload`: multipart form with a single `file` part.
///
/// The first `file` part that carries a usable filename is staged and
/// forwarded; other parts are skipped.
pub async fn upload_file(
    State(service): State<GatewayService>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let mut multipart = multipart.map_err(|rejection| {
        warn!(%rejection, "upload request is not multipart");
        AppError::bad_request(NO_FILE_UPLOADED)
    })?;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return Err(AppError::bad_request(NO_FILE_UPLOADED)),
            Err(err) => return Err(multipart_error(&err)),
        };

        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let Some(file_name) = field
            .file_name()
            .filter(|name| is_usable_key(name))
            .map(str::to_owned)
        else {
            continue;
        };

        return match service.upload_field(file_name.clone(), field).await {
            Ok(_) => Ok(Json(MessageResponse {
                message: "File uploaded successfully",
            })),
            Err(UploadError::Stage(StageError::Multipart(err))) => Err(multipart_error(&err)),
            Err(err) => {
                error!(bucket = %service.bucket(), key = %file_name, error = %err, "error uploading file");
                Err(AppError::internal(UPLOAD_FAILED))
            }
        };
    }
}

/// Client-side multipart failures: an oversized body keeps its 413, anything
/// else is a malformed request.
fn multipart_error(err: &MultipartError) -> AppError {
    warn!(error = %err, "rejecting multipart body");
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::new(StatusCode::PAYLOAD_TOO_LARGE, FILE_TOO_LARGE)
    } else {
        AppError::bad_request(INVALID_MULTIPART)
    }
}

/// `GET /files`: every object in the bucket, optionally under `?prefix=`.
pub async fn list_files(
    State(service): State<GatewayService>,
    Query(query): Query<ListFilesQuery>,
) -> Result<Json<Vec<ObjectSummary>>, AppError> {
    match service.list_files(query.prefix).await {
        Ok(files) => Ok(Json(files)),
        Err(err) => {
            error!(bucket = %service.bucket(), error = %err, "error listing files");
            Err(AppError::internal(LIST_FAILED))
        }
    }
}

/// `DELETE /files/{*key}`
pub async fn delete_file(
    State(service): State<GatewayService>,
    Path(key): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    if !is_usable_key(&key) {
        return Err(AppError::bad_request(FILE_KEY_REQUIRED));
    }

    match service.delete_file(&key).await {
        Ok(()) => Ok(Json(MessageResponse {
            message: "File deleted successfully",
        })),
        Err(err) => {
            error!(bucket = %service.bucket(), key = %key, error = %err, "error deleting file");
            Err(AppError::internal(DELETE_FAILED))
        }
    }
}

/// `DELETE /files` and `DELETE /files/` carry no key in the path.
pub async fn delete_without_key() -> AppError {
    AppError::bad_request(FILE_KEY_REQUIRED)
}
