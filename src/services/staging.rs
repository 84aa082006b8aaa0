//! Local staging of in-flight uploads.
//!
//! Each upload is streamed into `{dir}/.upload-{uuid}` before it is forwarded
//! to the object store. The [`StagedFile`] guard owns that path: it is removed
//! by [`StagedFile::discard`] on the normal path and by `Drop` on every other
//! exit (backend failure, client disconnect, handler error).

use axum::extract::multipart::{Field, MultipartError};
use bytes::Bytes;
use std::{
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};
use thiserror::Error;
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};
use tracing::{debug, warn};
use uuid::Uuid;

const STAGING_PREFIX: &str = ".upload-";

#[derive(Debug, Error)]
pub enum StageError {
    #[error("reading multipart field failed: {0}")]
    Multipart(#[from] MultipartError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Directory holding in-flight uploads.
///
/// One directory per gateway process: [`StagingArea::prepare`] treats every
/// `.upload-*` file it finds as a leftover, so two processes sharing a
/// directory would delete each other's in-flight uploads on startup.
#[derive(Clone, Debug)]
pub struct StagingArea {
    dir: PathBuf,
}

impl StagingArea {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the staging directory and sweep staging files left behind by a
    /// previous process. Returns how many leftovers were removed.
    pub async fn prepare(&self) -> io::Result<usize> {
        fs::create_dir_all(&self.dir).await?;

        let mut removed = 0;
        let mut entries = fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let is_staged = entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.starts_with(STAGING_PREFIX));
            if !is_staged || !entry.file_type().await?.is_file() {
                continue;
            }
            match fs::remove_file(entry.path()).await {
                Ok(()) => removed += 1,
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => return Err(err),
            }
        }
        Ok(removed)
    }

    /// Reserve a new, empty staging file.
    pub async fn create(
        &self,
        file_name: impl Into<String>,
        content_type: Option<String>,
    ) -> io::Result<StagedFile> {
        let path = self.dir.join(format!("{}{}", STAGING_PREFIX, Uuid::new_v4()));
        let writer = File::create(&path).await?;
        debug!(path = %path.display(), "created staging file");

        Ok(StagedFile {
            path,
            file_name: file_name.into(),
            content_type,
            size: 0,
            writer: Some(writer),
            removed: false,
        })
    }

    /// Stream a multipart file field to disk chunk by chunk.
    ///
    /// On any error the partially written file is removed before returning.
    pub async fn stage_field(
        &self,
        file_name: impl Into<String>,
        mut field: Field<'_>,
    ) -> Result<StagedFile, StageError> {
        let content_type = field.content_type().map(str::to_owned);
        let mut staged = self.create(file_name, content_type).await?;
        while let Some(chunk) = field.chunk().await? {
            staged.write_chunk(&chunk).await?;
        }
        staged.finish().await?;
        Ok(staged)
    }
}

/// An uploaded file sitting in the staging directory.
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
    file_name: String,
    content_type: Option<String>,
    size: u64,
    writer: Option<File>,
    removed: bool,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Filename as sent by the client.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub async fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| io::Error::other("staging file already finished"))?;
        writer.write_all(chunk).await?;
        self.size += chunk.len() as u64;
        Ok(())
    }

    /// Flush and close the writer. Idempotent.
    pub async fn finish(&mut self) -> io::Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush().await?;
            writer.sync_all().await?;
        }
        Ok(())
    }

    /// Read the whole staged payload into memory.
    pub async fn read(&self) -> io::Result<Bytes> {
        Ok(Bytes::from(fs::read(&self.path).await?))
    }

    /// Remove the staging file now instead of waiting for `Drop`.
    pub async fn discard(mut self) -> io::Result<()> {
        self.writer.take();
        self.removed = true;
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err),
        }
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        self.writer.take();
        // Drop cannot await; a single unlink is short enough to block on.
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "removed staging file on drop"),
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => warn!(
                path = %self.path.display(),
                error = %err,
                "failed to remove staging file"
            ),
        }
    }
}
