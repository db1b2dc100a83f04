//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage abstraction trait
///
/// Pipelines only ever read one whole object and write one whole object per
/// invocation, so the surface is deliberately small. Implementations hold no
/// per-invocation state and are shared across invocations behind an `Arc`.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Read the full body of `bucket/key`.
    ///
    /// Returns [`StorageError::NotFound`] when the object does not exist.
    async fn download(&self, bucket: &str, key: &str) -> StorageResult<Bytes>;

    /// Write `data` to `bucket/key` with an explicit content type, replacing any
    /// existing object. Returns the location of the written object.
    async fn upload_with_key(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<String>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
