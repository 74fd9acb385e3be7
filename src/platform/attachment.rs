//! Image attachments for notification content.
//!
//! Fetch failures are never fatal: the engine arms the notification without
//! an attachment instead.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Extension used when the source has none
const DEFAULT_EXTENSION: &str = "jpg";

#[derive(Debug, Error)]
pub enum AttachmentError {
    #[error("invalid attachment URI: {0}")]
    InvalidUri(String),

    #[error("unsupported attachment scheme: {0}")]
    UnsupportedScheme(String),

    #[error("attachment I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("attachments are disabled")]
    Disabled,
}

/// A local file the platform can display alongside a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub identifier: String,
    pub local_path: PathBuf,
    /// The URI the attachment was resolved from
    pub source: String,
}

/// Resolves a content item's image reference into a local attachment.
#[async_trait]
pub trait AttachmentFetcher: Send + Sync {
    async fn fetch(&self, uri: &str) -> Result<Attachment, AttachmentError>;
}

/// Fetcher that never produces attachments.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAttachments;

#[async_trait]
impl AttachmentFetcher for NoAttachments {
    async fn fetch(&self, _uri: &str) -> Result<Attachment, AttachmentError> {
        Err(AttachmentError::Disabled)
    }
}

/// Fetcher for images already on the local filesystem.
///
/// Accepts `file://` URIs and absolute paths. The source is copied into a
/// staging directory under a unique name, since platforms take ownership of
/// attachment files. Remote schemes are not supported.
#[derive(Debug, Clone)]
pub struct FileAttachments {
    staging_dir: PathBuf,
}

impl FileAttachments {
    pub fn new(staging_dir: impl Into<PathBuf>) -> Self {
        Self {
            staging_dir: staging_dir.into(),
        }
    }

    /// Local path referenced by `uri`
    pub fn resolve(uri: &str) -> Result<PathBuf, AttachmentError> {
        if let Some(path) = uri.strip_prefix("file://") {
            return Ok(PathBuf::from(path));
        }

        if let Some((scheme, _)) = uri.split_once("://") {
            return Err(AttachmentError::UnsupportedScheme(scheme.to_string()));
        }

        let path = Path::new(uri);
        if path.is_absolute() {
            Ok(path.to_path_buf())
        } else {
            Err(AttachmentError::InvalidUri(uri.to_string()))
        }
    }
}

impl Default for FileAttachments {
    fn default() -> Self {
        Self::new(std::env::temp_dir())
    }
}

#[async_trait]
impl AttachmentFetcher for FileAttachments {
    async fn fetch(&self, uri: &str) -> Result<Attachment, AttachmentError> {
        let source = Self::resolve(uri)?;

        let extension = source
            .extension()
            .and_then(|ext| ext.to_str())
            .filter(|ext| !ext.is_empty())
            .unwrap_or(DEFAULT_EXTENSION);

        tokio::fs::create_dir_all(&self.staging_dir).await?;
        let local_path = self
            .staging_dir
            .join(format!("{}.{}", Uuid::new_v4(), extension));
        tokio::fs::copy(&source, &local_path).await?;

        Ok(Attachment {
            identifier: Uuid::new_v4().to_string(),
            local_path,
            source: uri.to_string(),
        })
    }
}
