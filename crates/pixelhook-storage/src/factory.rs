#[cfg(feature = "storage-local")]
use crate::LocalStorage;
#[cfg(feature = "storage-s3")]
use crate::S3Storage;
use crate::{Storage, StorageBackend, StorageError, StorageResult};
use pixelhook_core::StorageConfig;
use std::sync::Arc;

/// Create a storage backend based on configuration
pub async fn create_storage(config: &StorageConfig) -> StorageResult<Arc<dyn Storage>> {
    match config.backend {
        #[cfg(feature = "storage-s3")]
        StorageBackend::S3 => {
            let region = config.aws_region.clone().ok_or_else(|| {
                StorageError::ConfigError("AWS_REGION not configured".to_string())
            })?;
            let storage = S3Storage::new(region, config.s3_endpoint.clone()).await?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-s3"))]
        StorageBackend::S3 => Err(StorageError::ConfigError(
            "S3 storage backend not available (storage-s3 feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let base_path = config.local_storage_path.clone().ok_or_else(|| {
                StorageError::ConfigError("LOCAL_STORAGE_PATH not configured".to_string())
            })?;
            let storage = LocalStorage::new(base_path).await?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(StorageError::ConfigError(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),
    }
}

#[cfg(all(test, feature = "storage-local"))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_local_storage() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            backend: StorageBackend::Local,
            aws_region: None,
            s3_endpoint: None,
            local_storage_path: Some(temp_dir.path().to_string_lossy().to_string()),
        };
        let storage = create_storage(&config).await.unwrap();
        assert_eq!(storage.backend_type(), StorageBackend::Local);
    }

    #[tokio::test]
    async fn test_create_local_storage_requires_path() {
        let config = StorageConfig {
            backend: StorageBackend::Local,
            aws_region: None,
            s3_endpoint: None,
            local_storage_path: None,
        };
        assert!(matches!(
            create_storage(&config).await,
            Err(StorageError::ConfigError(_))
        ));
    }

    #[cfg(feature = "storage-s3")]
    #[tokio::test]
    async fn test_create_s3_storage_requires_region() {
        let config = StorageConfig {
            backend: StorageBackend::S3,
            aws_region: None,
            s3_endpoint: None,
            local_storage_path: None,
        };
        assert!(matches!(
            create_storage(&config).await,
            Err(StorageError::ConfigError(_))
        ));
    }
}
