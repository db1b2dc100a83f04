//! Gemini captioning via the Generative Language `generateContent` endpoint

use async_trait::async_trait;
use base64::Engine;
use pixelhook_core::{Caption, CaptioningConfig, ImageBytes};
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter, Result as FmtResult};

use crate::http::{build_client, read_body, require_api_key};
use crate::traits::{CaptionError, CaptionModel};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const SUPPORTED_MEDIA_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/webp",
    "image/heic",
    "image/heif",
];

pub struct GeminiCaptioner {
    http_client: reqwest::Client,
    api_key: String,
    model: String,
    prompt: String,
    base_url: String,
}

impl Debug for GeminiCaptioner {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("GeminiCaptioner")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    InlineData { inline_data: InlineData },
    Text { text: String },
}

#[derive(Debug, Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GeminiCaptioner {
    pub fn new(config: &CaptioningConfig) -> Result<Self, CaptionError> {
        let api_key = require_api_key(config.api_key.as_deref(), "GOOGLE_API_KEY")?;
        let http_client = build_client(config.timeout())?;

        Ok(Self {
            http_client,
            api_key,
            model: config.model.clone(),
            prompt: config.prompt.clone(),
            base_url: config
                .api_base_url
                .clone()
                .unwrap_or_else(|| API_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    fn build_request(&self, image: &ImageBytes) -> GenerateContentRequest {
        let data = base64::engine::general_purpose::STANDARD.encode(image.data());
        GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: image.content_type().to_string(),
                            data,
                        },
                    },
                    Part::Text {
                        text: self.prompt.clone(),
                    },
                ],
            }],
        }
    }

    fn extract_text(body: &str) -> Result<String, CaptionError> {
        let parsed: GenerateContentResponse = serde_json::from_str(body)
            .map_err(|e| CaptionError::MalformedResponse(e.to_string()))?;

        let candidate = parsed
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| CaptionError::MalformedResponse("no candidates".to_string()))?;

        let content = candidate.content.ok_or_else(|| {
            CaptionError::MalformedResponse(format!(
                "candidate has no content (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            ))
        })?;

        let texts: Vec<String> = content.parts.into_iter().filter_map(|p| p.text).collect();
        if texts.is_empty() {
            return Err(CaptionError::MalformedResponse(
                "candidate has no text part".to_string(),
            ));
        }

        Ok(texts.concat())
    }
}

#[async_trait]
impl CaptionModel for GeminiCaptioner {
    fn name(&self) -> &str {
        "gemini"
    }

    fn accepts(&self, media_type: &str) -> bool {
        SUPPORTED_MEDIA_TYPES.contains(&media_type)
    }

    async fn caption(&self, image: &ImageBytes) -> Result<Caption, CaptionError> {
        let start = std::time::Instant::now();
        let request = self.build_request(image);

        let response = self
            .http_client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let body = read_body(response).await?;
        let text = Self::extract_text(&body)?;

        tracing::info!(
            model = %self.model,
            media_type = %image.content_type(),
            size_bytes = image.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Gemini caption generated"
        );

        Caption::new(text).ok_or(CaptionError::EmptyCaption)
    }
}
