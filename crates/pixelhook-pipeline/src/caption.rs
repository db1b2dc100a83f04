//! Caption pipeline
//!
//! `parse -> resolve secret -> connect -> fetch -> decode -> caption -> persist`
//!
//! Stages run strictly in sequence and the first failure ends the invocation.
//! There is no loop guard here: every upload, thumbnails included, gets a
//! caption update attempt for its identifier. A thumbnail shares its source's
//! identifier, so the caption generated from the thumbnail can replace the one
//! generated from the full-size image. The last update to commit wins.

use pixelhook_captioning::CaptionModel;
use pixelhook_core::{
    derive_identifier, parse_notification, Caption, EventError, HandlerResponse, ImageBytes,
    MissingRecordPolicy, PipelineKind,
};
use pixelhook_db::{CaptionRepository, CaptionSession, PersistOutcome};
use pixelhook_infra::CredentialResolver;
use pixelhook_processing::ImageDecoder;
use pixelhook_storage::Storage;
use serde_json::Value;
use std::sync::Arc;

use crate::error::PipelineError;

/// JPEG quality used when an image has to be re-encoded for the caption model
const MODEL_INPUT_JPEG_QUALITY: u8 = 90;

#[derive(Debug, Clone)]
pub struct CaptionSettings {
    /// Secret holding the database credentials
    pub secret_id: String,
    pub missing_record_policy: MissingRecordPolicy,
}

pub struct CaptionPipeline {
    storage: Arc<dyn Storage>,
    credentials: CredentialResolver,
    repository: Arc<dyn CaptionRepository>,
    model: Arc<dyn CaptionModel>,
    settings: CaptionSettings,
}

impl CaptionPipeline {
    pub fn new(
        storage: Arc<dyn Storage>,
        credentials: CredentialResolver,
        repository: Arc<dyn CaptionRepository>,
        model: Arc<dyn CaptionModel>,
        settings: CaptionSettings,
    ) -> Self {
        Self {
            storage,
            credentials,
            repository,
            model,
            settings,
        }
    }

    /// Handle one notification envelope.
    pub async fn handle(&self, event: &Value) -> HandlerResponse {
        tracing::debug!(event = %event, "Event received");

        match self.run(event).await {
            Ok(response) => response,
            Err(err) => err.into_response(PipelineKind::Caption),
        }
    }

    async fn run(&self, event: &Value) -> Result<HandlerResponse, PipelineError> {
        let notification = parse_notification(event)?;
        let identifier = derive_identifier(&notification.key)
            .ok_or_else(|| EventError::NoFileName(notification.key.clone()))?;

        tracing::info!(
            bucket = %notification.bucket,
            key = %notification.key,
            identifier = %identifier,
            "New image uploaded"
        );

        let credentials = self.credentials.resolve(&self.settings.secret_id).await?;
        tracing::info!(host = %credentials.host, "Loaded database secret");

        let session = self
            .repository
            .open(&credentials)
            .await
            .map_err(PipelineError::Connect)?;

        let caption = match self.describe(&notification.bucket, &notification.key).await {
            Ok(caption) => caption,
            Err(err) => {
                session.close().await;
                return Err(err);
            }
        };

        tracing::info!(identifier = %identifier, caption = %caption, "Generated caption");

        self.persist(session, &identifier, &caption, &notification.key).await
    }

    /// Fetch, decode and caption the uploaded object.
    async fn describe(&self, bucket: &str, key: &str) -> Result<Caption, PipelineError> {
        let data = self
            .storage
            .download(bucket, key)
            .await
            .map_err(|source| PipelineError::Fetch {
                pipeline: PipelineKind::Caption,
                source,
            })?;
        let image = ImageBytes::new(data);

        let decoded = ImageDecoder::decode_blocking(image.clone())
            .await
            .map_err(|source| PipelineError::Decode {
                pipeline: PipelineKind::Caption,
                source,
            })?;
        tracing::debug!(
            width = decoded.width(),
            height = decoded.height(),
            format = ?decoded.format(),
            had_alpha = decoded.had_alpha(),
            "Decoded source image"
        );

        let model_input = if self.model.accepts(image.content_type()) {
            image
        } else {
            tracing::debug!(
                model = self.model.name(),
                media_type = image.content_type(),
                "Re-encoding image as JPEG for caption model"
            );
            decoded
                .to_jpeg(MODEL_INPUT_JPEG_QUALITY)
                .map_err(|source| PipelineError::Encode {
                    pipeline: PipelineKind::Caption,
                    source,
                })?
        };

        Ok(self.model.caption(&model_input).await?)
    }

    async fn persist(
        &self,
        session: Box<dyn CaptionSession>,
        identifier: &str,
        caption: &Caption,
        key: &str,
    ) -> Result<HandlerResponse, PipelineError> {
        let outcome = session
            .update_caption(identifier, caption)
            .await
            .map_err(PipelineError::Persistence)?;

        match (outcome, self.settings.missing_record_policy) {
            (PersistOutcome::Updated { rows }, _) => {
                tracing::info!(identifier = %identifier, rows = rows, "Caption saved");
                Ok(HandlerResponse::ok(format!(
                    "Caption for {} saved successfully.",
                    key
                )))
            }
            (PersistOutcome::NotFound, MissingRecordPolicy::Fail) => {
                Err(PipelineError::RecordNotFound(identifier.to_string()))
            }
            (PersistOutcome::NotFound, MissingRecordPolicy::Ignore) => {
                tracing::warn!(identifier = %identifier, "No caption record to update");
                Ok(HandlerResponse::ok(format!(
                    "No caption record for {}; nothing updated.",
                    identifier
                )))
            }
        }
    }
}
