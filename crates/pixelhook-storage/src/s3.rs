use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::Error as ObjectStoreError;
use object_store::{
    Attribute, Attributes, GetOptions, ObjectStore, PutOptions, PutPayload,
    Result as ObjectResult,
};

/// S3 storage implementation
///
/// The bucket is only known per notification, so a bucket-bound client is
/// built for each call. Builders read credentials from the environment, which
/// inside the function runtime means the execution role.
#[derive(Clone)]
pub struct S3Storage {
    region: String,
    endpoint_url: Option<String>, // Custom endpoint for S3-compatible providers
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO, "http://localhost:4566" for LocalStack)
    pub async fn new(region: String, endpoint_url: Option<String>) -> StorageResult<Self> {
        if region.is_empty() {
            return Err(StorageError::ConfigError("S3 region is empty".to_string()));
        }

        Ok(S3Storage {
            region,
            endpoint_url,
        })
    }

    fn store_for(&self, bucket: &str) -> StorageResult<AmazonS3> {
        let mut builder = AmazonS3Builder::from_env()
            .with_region(self.region.clone())
            .with_bucket_name(bucket.to_string());

        if let Some(ref endpoint) = self.endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))
    }

    /// Generate public URL for S3 object
    ///
    /// For AWS S3, uses the standard format: https://{bucket}.s3.{region}.amazonaws.com/{key}
    /// For S3-compatible providers, uses path-style URLs on the endpoint
    fn generate_url(&self, bucket: &str, key: &str) -> String {
        if let Some(ref endpoint) = self.endpoint_url {
            format!("{}/{}/{}", endpoint.trim_end_matches('/'), bucket, key)
        } else {
            format!("https://{}.s3.{}.amazonaws.com/{}", bucket, self.region, key)
        }
    }
}

/// Object location for a decoded storage key.
///
/// `Path::from` would percent-escape characters S3 allows in keys (`[`, `%`,
/// `~`, ...), so keys are parsed as-is and only rejected when object_store
/// cannot represent them (empty segments, `.` or `..`).
fn location(key: &str) -> StorageResult<Path> {
    Path::parse(key).map_err(|e| StorageError::InvalidKey(e.to_string()))
}

#[async_trait]
impl Storage for S3Storage {
    async fn download(&self, bucket: &str, key: &str) -> StorageResult<Bytes> {
        let start = std::time::Instant::now();
        let store = self.store_for(bucket)?;
        let path = location(key)?;

        let result: ObjectResult<_> = store.get_opts(&path, GetOptions::default()).await;

        let result = result.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(format!("{}/{}", bucket, key)),
            other => {
                tracing::error!(
                    error = %other,
                    bucket = %bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 download failed"
                );
                StorageError::DownloadFailed(other.to_string())
            }
        })?;

        let bytes = result
            .bytes()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?;

        tracing::info!(
            bucket = %bucket,
            key = %key,
            size_bytes = bytes.len() as u64,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 download successful"
        );

        Ok(bytes)
    }

    async fn upload_with_key(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<String> {
        let start = std::time::Instant::now();
        let store = self.store_for(bucket)?;
        let size = data.len() as u64;
        let path = location(key)?;

        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, content_type.to_string().into());
        let options = PutOptions {
            attributes,
            ..Default::default()
        };

        let result: ObjectResult<_> = store
            .put_opts(&path, PutPayload::from(data), options)
            .await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %bucket,
                key = %key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 upload_with_key failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        let url = self.generate_url(bucket, key);

        tracing::info!(
            bucket = %bucket,
            key = %key,
            content_type = %content_type,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload_with_key successful"
        );

        Ok(url)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}
