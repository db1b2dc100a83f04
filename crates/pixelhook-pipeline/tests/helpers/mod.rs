//! Test helpers: fakes for every collaborator plus envelope and image fixtures.
//!
//! Run from workspace root: `cargo test -p pixelhook-pipeline`.

#![allow(dead_code)]

pub mod fakes;
pub mod fixtures;

use fakes::{RecordingCaptionRepository, RecordingStorage, ScriptedCaptionModel, ScriptedSecretSource};
use pixelhook_core::{MissingRecordPolicy, ThumbnailConfig};
use pixelhook_infra::CredentialResolver;
use pixelhook_pipeline::{CaptionPipeline, CaptionSettings, ThumbnailPipeline};
use pixelhook_processing::ThumbnailGenerator;
use std::sync::Arc;

pub const BUCKET: &str = "uploads";
pub const SECRET_ID: &str = "prod/captions/db";

/// Collaborators of a caption pipeline, kept around for assertions.
pub struct CaptionHarness {
    pub storage: Arc<RecordingStorage>,
    pub secrets: Arc<ScriptedSecretSource>,
    pub repository: Arc<RecordingCaptionRepository>,
    pub model: Arc<ScriptedCaptionModel>,
    pub pipeline: CaptionPipeline,
}

impl CaptionHarness {
    pub fn new(model: ScriptedCaptionModel, policy: MissingRecordPolicy) -> Self {
        let storage = Arc::new(RecordingStorage::new());
        let secrets = Arc::new(ScriptedSecretSource::valid());
        let repository = Arc::new(RecordingCaptionRepository::new());
        let model = Arc::new(model);

        let pipeline = CaptionPipeline::new(
            storage.clone(),
            CredentialResolver::new(secrets.clone()),
            repository.clone(),
            model.clone(),
            CaptionSettings {
                secret_id: SECRET_ID.to_string(),
                missing_record_policy: policy,
            },
        );

        Self {
            storage,
            secrets,
            repository,
            model,
            pipeline,
        }
    }

    /// Pipeline with a caption model that answers `caption` and the default policy.
    pub fn captioning(caption: &str) -> Self {
        Self::new(ScriptedCaptionModel::answering(caption), MissingRecordPolicy::Fail)
    }

    /// Rebuild the pipeline around a different secret source.
    pub fn with_secrets(mut self, secrets: ScriptedSecretSource) -> Self {
        self.secrets = Arc::new(secrets);
        self.pipeline = CaptionPipeline::new(
            self.storage.clone(),
            CredentialResolver::new(self.secrets.clone()),
            self.repository.clone(),
            self.model.clone(),
            CaptionSettings {
                secret_id: SECRET_ID.to_string(),
                missing_record_policy: MissingRecordPolicy::Fail,
            },
        );
        self
    }
}

pub fn thumbnail_pipeline(storage: Arc<dyn pixelhook_storage::Storage>) -> ThumbnailPipeline {
    ThumbnailPipeline::new(storage, ThumbnailGenerator::new(&ThumbnailConfig::default()))
}
