#[cfg(feature = "caption-claude")]
use crate::ClaudeCaptioner;
#[cfg(feature = "caption-gemini")]
use crate::GeminiCaptioner;
use crate::{CaptionError, CaptionModel};
use pixelhook_core::{CaptionProvider, CaptioningConfig};
use std::sync::Arc;

/// Create the caption model selected by configuration
pub fn create_caption_model(
    config: &CaptioningConfig,
) -> Result<Arc<dyn CaptionModel>, CaptionError> {
    let model: Arc<dyn CaptionModel> = match config.provider {
        #[cfg(feature = "caption-gemini")]
        CaptionProvider::Gemini => Arc::new(GeminiCaptioner::new(config)?),

        #[cfg(not(feature = "caption-gemini"))]
        CaptionProvider::Gemini => {
            return Err(CaptionError::Config(
                "Gemini backend not available (caption-gemini feature not enabled)".to_string(),
            ))
        }

        #[cfg(feature = "caption-claude")]
        CaptionProvider::Claude => Arc::new(ClaudeCaptioner::new(config)?),

        #[cfg(not(feature = "caption-claude"))]
        CaptionProvider::Claude => {
            return Err(CaptionError::Config(
                "Claude backend not available (caption-claude feature not enabled)".to_string(),
            ))
        }
    };

    tracing::info!(provider = model.name(), model = %config.model, "Caption model initialized");
    Ok(model)
}
