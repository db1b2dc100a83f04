use crate::traits::CaptionError;
use std::time::Duration;

const MAX_ERROR_BODY_CHARS: usize = 512;

pub(crate) fn build_client(timeout: Duration) -> Result<reqwest::Client, CaptionError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| CaptionError::Config(format!("Failed to create HTTP client: {}", e)))
}

/// Reject missing and placeholder keys before any request is made.
pub(crate) fn require_api_key(key: Option<&str>, variable: &str) -> Result<String, CaptionError> {
    match key {
        None | Some("") => Err(CaptionError::Config(format!("{} is not set", variable))),
        Some(key) if key == "your-api-key" || key.len() < 10 => Err(CaptionError::Config(
            format!("{} appears to be invalid or a placeholder", variable),
        )),
        Some(key) => Ok(key.to_string()),
    }
}

/// Read the body of a response, turning non-success statuses into [`CaptionError::Api`].
pub(crate) async fn read_body(response: reqwest::Response) -> Result<String, CaptionError> {
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        return Err(CaptionError::Api {
            status: status.as_u16(),
            body: text.chars().take(MAX_ERROR_BODY_CHARS).collect(),
        });
    }

    Ok(text)
}
