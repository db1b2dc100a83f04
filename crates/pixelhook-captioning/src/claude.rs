//! Claude captioning via Anthropic's Messages API

use async_trait::async_trait;
use base64::Engine;
use pixelhook_core::{Caption, CaptioningConfig, ImageBytes};
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter, Result as FmtResult};

use crate::http::{build_client, read_body, require_api_key};
use crate::traits::{CaptionError, CaptionModel};

const API_BASE: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";
const SUPPORTED_MEDIA_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];

pub struct ClaudeCaptioner {
    http_client: reqwest::Client,
    api_key: String,
    model: String,
    max_tokens: u32,
    prompt: String,
    base_url: String,
}

impl Debug for ClaudeCaptioner {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ClaudeCaptioner")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

// Messages API request/response structures
#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<MessageParam>,
}

#[derive(Debug, Serialize)]
struct MessageParam {
    role: String,
    content: Vec<ContentBlock>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: String },
    Image { source: ImageSource },
}

#[derive(Debug, Serialize)]
struct ImageSource {
    #[serde(rename = "type")]
    source_type: String,
    media_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlockResponse>,
    #[serde(default)]
    usage: Option<AnthropicUsage>,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlockResponse {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

impl ClaudeCaptioner {
    pub fn new(config: &CaptioningConfig) -> Result<Self, CaptionError> {
        let api_key = require_api_key(config.api_key.as_deref(), "ANTHROPIC_API_KEY")?;
        let http_client = build_client(config.timeout())?;

        Ok(Self {
            http_client,
            api_key,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            prompt: config.prompt.clone(),
            base_url: config
                .api_base_url
                .clone()
                .unwrap_or_else(|| API_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
        })
    }

    fn build_request(&self, image: &ImageBytes) -> MessagesRequest {
        let base64_image = base64::engine::general_purpose::STANDARD.encode(image.data());

        MessagesRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            messages: vec![MessageParam {
                role: "user".to_string(),
                content: vec![
                    ContentBlock::Image {
                        source: ImageSource {
                            source_type: "base64".to_string(),
                            media_type: image.content_type().to_string(),
                            data: base64_image,
                        },
                    },
                    ContentBlock::Text {
                        text: self.prompt.clone(),
                    },
                ],
            }],
        }
    }

    fn extract_text(body: &str) -> Result<(String, Option<AnthropicUsage>), CaptionError> {
        let parsed: MessagesResponse = serde_json::from_str(body)
            .map_err(|e| CaptionError::MalformedResponse(e.to_string()))?;

        let text = parsed
            .content
            .into_iter()
            .find_map(|b| match b {
                ContentBlockResponse::Text { text } => Some(text),
                ContentBlockResponse::Other => None,
            })
            .ok_or_else(|| CaptionError::MalformedResponse("no text block".to_string()))?;

        Ok((text, parsed.usage))
    }
}

#[async_trait]
impl CaptionModel for ClaudeCaptioner {
    fn name(&self) -> &str {
        "claude"
    }

    fn accepts(&self, media_type: &str) -> bool {
        SUPPORTED_MEDIA_TYPES.contains(&media_type)
    }

    async fn caption(&self, image: &ImageBytes) -> Result<Caption, CaptionError> {
        let start = std::time::Instant::now();
        let body = self.build_request(image);

        let response = self
            .http_client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let text = read_body(response).await?;
        let (caption, usage) = Self::extract_text(&text)?;

        tracing::info!(
            model = %self.model,
            media_type = %image.content_type(),
            size_bytes = image.len(),
            input_tokens = usage.as_ref().map(|u| u.input_tokens),
            output_tokens = usage.as_ref().map(|u| u.output_tokens),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Claude caption generated"
        );

        Caption::new(caption).ok_or(CaptionError::EmptyCaption)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pixelhook_core::CaptionProvider;

    fn config(base_url: &str) -> CaptioningConfig {
        CaptioningConfig {
            provider: CaptionProvider::Claude,
            api_key: Some("sk-ant-test-0123456789".to_string()),
            model: "claude-sonnet-4-20250514".to_string(),
            prompt: "Caption this image.".to_string(),
            max_tokens: 256,
            timeout_secs: 5,
            api_base_url: Some(base_url.to_string()),
        }
    }

    fn png() -> ImageBytes {
        ImageBytes::new(vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A])
    }

    #[test]
    fn test_request_shape() {
        let captioner = ClaudeCaptioner::new(&config("http://localhost")).unwrap();
        let request = serde_json::to_value(captioner.build_request(&png())).unwrap();
        assert_eq!(request["max_tokens"], 256);
        let content = &request["messages"][0]["content"];
        assert_eq!(content[0]["type"], "image");
        assert_eq!(content[0]["source"]["type"], "base64");
        assert_eq!(content[0]["source"]["media_type"], "image/png");
        assert_eq!(content[1]["type"], "text");
        assert_eq!(content[1]["text"], "Caption this image.");
    }

    #[test]
    fn test_accepts() {
        let captioner = ClaudeCaptioner::new(&config("http://localhost")).unwrap();
        assert!(captioner.accepts("image/gif"));
        assert!(!captioner.accepts("image/heic"));
        assert!(!captioner.accepts("application/octet-stream"));
    }

    #[test]
    fn test_rejects_placeholder_key() {
        let mut cfg = config("http://localhost");
        cfg.api_key = Some("your-api-key".to_string());
        assert!(matches!(
            ClaudeCaptioner::new(&cfg),
            Err(CaptionError::Config(_))
        ));
    }

    #[test]
    fn test_extract_text_skips_non_text_blocks() {
        let body = r#"{"content":[{"type":"thinking","thinking":"..."},{"type":"text","text":"A cat."}],"usage":{"input_tokens":10,"output_tokens":3}}"#;
        let (text, usage) = ClaudeCaptioner::extract_text(body).unwrap();
        assert_eq!(text, "A cat.");
        assert_eq!(usage.unwrap().output_tokens, 3);
    }

    #[tokio::test]
    async fn test_caption_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/messages")
            .match_header("x-api-key", "sk-ant-test-0123456789")
            .match_header("anthropic-version", API_VERSION)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"content":[{"type":"text","text":"A red kite over a hill."}]}"#)
            .create_async()
            .await;

        let captioner = ClaudeCaptioner::new(&config(&server.url())).unwrap();
        let caption = captioner.caption(&png()).await.unwrap();

        assert_eq!(caption.as_str(), "A red kite over a hill.");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_caption_server_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/messages")
            .with_status(529)
            .with_body(r#"{"type":"error","error":{"type":"overloaded_error"}}"#)
            .create_async()
            .await;

        let captioner = ClaudeCaptioner::new(&config(&server.url())).unwrap();
        assert!(matches!(
            captioner.caption(&png()).await,
            Err(CaptionError::Api { status: 529, .. })
        ));
    }

    #[tokio::test]
    async fn test_caption_without_text_block() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/messages")
            .with_status(200)
            .with_body(r#"{"content":[]}"#)
            .create_async()
            .await;

        let captioner = ClaudeCaptioner::new(&config(&server.url())).unwrap();
        assert!(matches!(
            captioner.caption(&png()).await,
            Err(CaptionError::MalformedResponse(_))
        ));
    }
}
