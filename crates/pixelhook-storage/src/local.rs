use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem storage implementation
///
/// Objects live at `{base_path}/{bucket}/{key}`. Used for replaying events on a
/// workstation and by integration tests; content types are not persisted.
#[derive(Clone, Debug)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory holding one sub-directory per bucket
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage { base_path })
    }

    /// Convert bucket and key to a filesystem path with traversal validation
    fn object_path(&self, bucket: &str, key: &str) -> StorageResult<PathBuf> {
        if bucket.is_empty() || bucket.contains('/') || bucket.contains("..") {
            return Err(StorageError::InvalidKey(format!(
                "Bucket name is not a single path segment: {:?}",
                bucket
            )));
        }
        if key.is_empty() || key.starts_with('/') || key.split('/').any(|s| s == "..") {
            return Err(StorageError::InvalidKey(format!(
                "Storage key contains invalid segments: {:?}",
                key
            )));
        }

        Ok(self.base_path.join(bucket).join(key))
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn download(&self, bucket: &str, key: &str) -> StorageResult<Bytes> {
        let path = self.object_path(bucket, key)?;
        let start = std::time::Instant::now();

        let data = fs::read(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::NotFound(format!("{}/{}", bucket, key)),
            _ => StorageError::DownloadFailed(format!(
                "Failed to read file {}: {}",
                path.display(),
                e
            )),
        })?;

        tracing::info!(
            path = %path.display(),
            bucket = %bucket,
            key = %key,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage download successful"
        );

        Ok(Bytes::from(data))
    }

    async fn upload_with_key(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<String> {
        let path = self.object_path(bucket, key)?;
        let size = data.len();

        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        file.write_all(&data).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            bucket = %bucket,
            key = %key,
            content_type = %content_type,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(format!("file://{}", path.display()))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
