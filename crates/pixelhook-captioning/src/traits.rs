//! Caption model abstraction

use async_trait::async_trait;
use pixelhook_core::{Caption, ImageBytes};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptionError {
    #[error("Caption model not configured: {0}")]
    Config(String),

    #[error("Caption request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Caption API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Malformed caption response: {0}")]
    MalformedResponse(String),

    #[error("Caption model returned no text")]
    EmptyCaption,
}

#[async_trait]
pub trait CaptionModel: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &str;

    /// Whether the model takes this MIME type as-is
    fn accepts(&self, media_type: &str) -> bool;

    async fn caption(&self, image: &ImageBytes) -> Result<Caption, CaptionError>;
}
