//! Pipeline setup and initialization

pub mod caption;
pub mod storage;

use anyhow::{Context, Result};
use pixelhook_core::{PipelineConfig, PipelineKind};
use pixelhook_infra::init_telemetry;
use pixelhook_pipeline::{ThumbnailPipeline, UploadHandler};
use pixelhook_processing::ThumbnailGenerator;
use std::sync::Arc;

/// Validate configuration, start telemetry and build the requested pipeline.
pub async fn initialize_pipeline(
    kind: PipelineKind,
    config: &PipelineConfig,
) -> Result<Arc<dyn UploadHandler>> {
    config
        .validate_for(kind)
        .context("Configuration validation failed")?;

    init_telemetry(&config.telemetry)
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(
        pipeline = %kind,
        environment = %config.environment,
        production = config.is_production(),
        "Configuration loaded and validated successfully"
    );

    build_pipeline(kind, config).await
}

/// Build the pipeline without touching global telemetry state.
pub async fn build_pipeline(
    kind: PipelineKind,
    config: &PipelineConfig,
) -> Result<Arc<dyn UploadHandler>> {
    let storage = storage::setup_storage(config).await?;

    let handler: Arc<dyn UploadHandler> = match kind {
        PipelineKind::Caption => Arc::new(caption::setup_caption_pipeline(config, storage).await?),
        PipelineKind::Thumbnail => Arc::new(ThumbnailPipeline::new(
            storage,
            ThumbnailGenerator::new(&config.thumbnail),
        )),
    };

    tracing::info!(pipeline = %kind, "Pipeline initialized");
    Ok(handler)
}
