//! Thumbnail pipeline
//!
//! `parse -> loop guard -> fetch -> decode -> generate -> publish`
//!
//! Thumbnails are written back into the bucket the pipeline listens on. The
//! guard runs before any storage access, so the pipeline's own writes end in a
//! cheap skip instead of an endless chain of invocations.

use pixelhook_core::{parse_notification, EventError, HandlerResponse, ImageBytes, PipelineKind};
use pixelhook_processing::{ImageDecoder, ThumbnailGenerator};
use pixelhook_storage::Storage;
use serde_json::Value;
use std::sync::Arc;

use crate::error::PipelineError;

pub const SKIP_MESSAGE: &str = "Thumbnail detected. Skipping.";

pub struct ThumbnailPipeline {
    storage: Arc<dyn Storage>,
    generator: ThumbnailGenerator,
}

impl ThumbnailPipeline {
    pub fn new(storage: Arc<dyn Storage>, generator: ThumbnailGenerator) -> Self {
        Self { storage, generator }
    }

    /// Handle one notification envelope.
    pub async fn handle(&self, event: &Value) -> HandlerResponse {
        tracing::debug!(event = %event, "Event received");

        match self.run(event).await {
            Ok(response) => response,
            Err(err) => err.into_response(PipelineKind::Thumbnail),
        }
    }

    async fn run(&self, event: &Value) -> Result<HandlerResponse, PipelineError> {
        let notification = parse_notification(event)?;

        if self.generator.prefix().is_reserved(&notification.key) {
            tracing::info!(
                bucket = %notification.bucket,
                key = %notification.key,
                prefix = %self.generator.prefix(),
                "Thumbnail detected, skipping"
            );
            return Ok(HandlerResponse::ok(SKIP_MESSAGE));
        }

        if self.generator.thumbnail_key(&notification.key).is_none() {
            return Err(EventError::NoFileName(notification.key).into());
        }

        tracing::info!(
            bucket = %notification.bucket,
            key = %notification.key,
            "New image uploaded"
        );

        let data = self
            .storage
            .download(&notification.bucket, &notification.key)
            .await
            .map_err(|source| PipelineError::Fetch {
                pipeline: PipelineKind::Thumbnail,
                source,
            })?;

        let decoded = ImageDecoder::decode_blocking(ImageBytes::new(data))
            .await
            .map_err(|source| PipelineError::Decode {
                pipeline: PipelineKind::Thumbnail,
                source,
            })?;
        tracing::debug!(
            width = decoded.width(),
            height = decoded.height(),
            format = ?decoded.format(),
            had_alpha = decoded.had_alpha(),
            "Decoded source image"
        );

        let thumbnail = self
            .generator
            .generate_blocking(decoded, notification.key.clone())
            .await
            .map_err(|source| PipelineError::Encode {
                pipeline: PipelineKind::Thumbnail,
                source,
            })?;

        self.storage
            .upload_with_key(
                &notification.bucket,
                &thumbnail.key,
                thumbnail.data,
                thumbnail.content_type,
            )
            .await
            .map_err(PipelineError::Publish)?;

        tracing::info!(
            bucket = %notification.bucket,
            key = %thumbnail.key,
            width = thumbnail.width,
            height = thumbnail.height,
            "Thumbnail saved"
        );

        Ok(HandlerResponse::ok(format!(
            "Thumbnail saved to {}",
            thumbnail.key
        )))
    }
}
