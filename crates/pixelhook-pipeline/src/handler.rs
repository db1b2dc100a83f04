use async_trait::async_trait;
use pixelhook_core::{HandlerResponse, PipelineKind};
use serde_json::Value;

use crate::{CaptionPipeline, ThumbnailPipeline};

/// A pipeline that answers one notification envelope per invocation.
#[async_trait]
pub trait UploadHandler: Send + Sync {
    fn kind(&self) -> PipelineKind;

    async fn handle(&self, event: &Value) -> HandlerResponse;
}

#[async_trait]
impl UploadHandler for CaptionPipeline {
    fn kind(&self) -> PipelineKind {
        PipelineKind::Caption
    }

    async fn handle(&self, event: &Value) -> HandlerResponse {
        CaptionPipeline::handle(self, event).await
    }
}

#[async_trait]
impl UploadHandler for ThumbnailPipeline {
    fn kind(&self) -> PipelineKind {
        PipelineKind::Thumbnail
    }

    async fn handle(&self, event: &Value) -> HandlerResponse {
        ThumbnailPipeline::handle(self, event).await
    }
}
