//! Blob loading: the file-system collaborator behind each subscribe.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;

/// Why a blob could not be loaded. Never fatal; the session just stays idle.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("blob not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read {0}: {1}")]
    ReadError(PathBuf, std::io::Error),
}

/// Source of the blob served to each subscriber.
///
/// Called once per subscribe. Implementations must not retry.
#[async_trait]
pub trait BlobLoader: Send + Sync {
    async fn load(&self, path: &Path) -> Result<Bytes, LoadError>;
}

/// Reads the blob from disk without blocking the adapter's runtime thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLoader;

#[async_trait]
impl BlobLoader for FsLoader {
    async fn load(&self, path: &Path) -> Result<Bytes, LoadError> {
        match tokio::fs::read(path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(LoadError::NotFound(path.to_path_buf())),
            Err(e) => Err(LoadError::ReadError(path.to_path_buf(), e)),
        }
    }
}
