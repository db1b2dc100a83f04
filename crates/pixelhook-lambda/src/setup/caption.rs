//! Caption pipeline collaborators

use anyhow::Result;
use pixelhook_captioning::create_caption_model;
use pixelhook_core::PipelineConfig;
use pixelhook_db::MySqlCaptionRepository;
use pixelhook_infra::{CredentialResolver, SecretsManagerSource};
use pixelhook_pipeline::{CaptionPipeline, CaptionSettings};
use pixelhook_storage::Storage;
use std::sync::Arc;

pub async fn setup_caption_pipeline(
    config: &PipelineConfig,
    storage: Arc<dyn Storage>,
) -> Result<CaptionPipeline> {
    let secret_id = config
        .database
        .secret_name
        .clone()
        .ok_or_else(|| anyhow::anyhow!("SECRET_NAME must be set for the caption pipeline"))?;
    let region = config
        .database
        .secret_region
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("REGION or AWS_REGION must be set for the caption pipeline"))?;

    let secrets = SecretsManagerSource::new(region).await;
    tracing::info!(region = %region, "Secret store client initialized");

    let repository = MySqlCaptionRepository::from_config(&config.database)?;
    let model = create_caption_model(&config.captioning)?;

    Ok(CaptionPipeline::new(
        storage,
        CredentialResolver::new(Arc::new(secrets)),
        Arc::new(repository),
        model,
        CaptionSettings {
            secret_id,
            missing_record_policy: config.database.missing_record_policy,
        },
    ))
}
