//! Configuration module
//!
//! Both pipelines are configured from the environment (optionally seeded from a
//! `.env` file). Each pipeline only validates the settings it actually uses, so
//! the thumbnail function can be deployed without database or model settings.

use std::env;
use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use std::time::Duration;

use crate::keys::{ReservedPrefix, DEFAULT_THUMBNAIL_PREFIX};
use crate::storage_types::StorageBackend;

// Common constants
const DEFAULT_LOG_FILTER: &str = "pixelhook=debug,info";
const DEFAULT_CAPTION_PROMPT: &str = "Caption this image.";
const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_CLAUDE_MODEL: &str = "claude-sonnet-4-20250514";
const CAPTION_MAX_TOKENS: u32 = 1024;
const CAPTION_TIMEOUT_SECS: u64 = 60;
const DB_CONNECT_TIMEOUT_SECS: u64 = 5;
const CAPTION_TABLE: &str = "captions";
const CAPTION_COLUMN: &str = "caption";
const CAPTION_KEY_COLUMN: &str = "image_key";
const THUMBNAIL_MAX_DIMENSION: u32 = 128;
const THUMBNAIL_JPEG_QUALITY: u8 = 75;

/// Which pipeline a process is serving
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineKind {
    Caption,
    Thumbnail,
}

impl Display for PipelineKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            PipelineKind::Caption => write!(f, "caption"),
            PipelineKind::Thumbnail => write!(f, "thumbnail"),
        }
    }
}

impl FromStr for PipelineKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "caption" | "captioning" => Ok(PipelineKind::Caption),
            "thumbnail" | "thumbnailing" => Ok(PipelineKind::Thumbnail),
            _ => Err(anyhow::anyhow!("Invalid pipeline: {}", s)),
        }
    }
}

/// External model used to describe images
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptionProvider {
    Gemini,
    Claude,
}

impl CaptionProvider {
    pub fn default_model(&self) -> &'static str {
        match self {
            CaptionProvider::Gemini => DEFAULT_GEMINI_MODEL,
            CaptionProvider::Claude => DEFAULT_CLAUDE_MODEL,
        }
    }

    fn api_key_var(&self) -> &'static str {
        match self {
            CaptionProvider::Gemini => "GOOGLE_API_KEY",
            CaptionProvider::Claude => "ANTHROPIC_API_KEY",
        }
    }
}

impl FromStr for CaptionProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" | "google" => Ok(CaptionProvider::Gemini),
            "claude" | "anthropic" => Ok(CaptionProvider::Claude),
            _ => Err(anyhow::anyhow!("Invalid caption provider: {}", s)),
        }
    }
}

/// What the caption pipeline does when the update matches no row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingRecordPolicy {
    /// Fail the invocation so platform redelivery can retry once the row exists
    Fail,
    /// Acknowledge the invocation and log a warning
    Ignore,
}

impl FromStr for MissingRecordPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fail" => Ok(MissingRecordPolicy::Fail),
            "ignore" => Ok(MissingRecordPolicy::Ignore),
            _ => Err(anyhow::anyhow!("Invalid missing record policy: {}", s)),
        }
    }
}

#[derive(Clone, Debug)]
pub struct TelemetryConfig {
    /// Emit JSON lines (the default inside the function runtime)
    pub json: bool,
    /// Filter used when `RUST_LOG` is not set
    pub default_filter: String,
}

#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub aws_region: Option<String>,
    // Custom endpoint for S3-compatible providers (MinIO, LocalStack, ...)
    pub s3_endpoint: Option<String>,
    pub local_storage_path: Option<String>,
}

#[derive(Clone)]
pub struct CaptioningConfig {
    pub provider: CaptionProvider,
    pub api_key: Option<String>,
    pub model: String,
    pub prompt: String,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    pub api_base_url: Option<String>,
}

impl CaptioningConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Debug for CaptioningConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("CaptioningConfig")
            .field("provider", &self.provider)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("prompt", &self.prompt)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    /// Secret holding the connection parameters
    pub secret_name: Option<String>,
    /// Region of the secret store
    pub secret_region: Option<String>,
    pub connect_timeout_secs: u64,
    pub table: String,
    pub caption_column: String,
    pub key_column: String,
    pub missing_record_policy: MissingRecordPolicy,
}

impl DatabaseConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

#[derive(Clone, Debug)]
pub struct ThumbnailConfig {
    pub prefix: ReservedPrefix,
    pub max_dimension: u32,
    pub jpeg_quality: u8,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            prefix: ReservedPrefix::default(),
            max_dimension: THUMBNAIL_MAX_DIMENSION,
            jpeg_quality: THUMBNAIL_JPEG_QUALITY,
        }
    }
}

/// Application configuration shared by both pipelines
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub environment: String,
    pub telemetry: TelemetryConfig,
    pub storage: StorageConfig,
    pub captioning: CaptioningConfig,
    pub database: DatabaseConfig,
    pub thumbnail: ThumbnailConfig,
}

impl PipelineConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|s| !s.trim().is_empty());

        let environment = var("ENVIRONMENT")
            .or_else(|| var("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let telemetry = TelemetryConfig {
            json: var("LOG_FORMAT")
                .map(|f| f.to_lowercase() != "text")
                .unwrap_or(true),
            default_filter: DEFAULT_LOG_FILTER.to_string(),
        };

        let aws_region = var("AWS_REGION");
        let storage = StorageConfig {
            backend: var("STORAGE_BACKEND")
                .map(|s| s.parse())
                .transpose()?
                .unwrap_or(StorageBackend::S3),
            aws_region: aws_region.clone(),
            s3_endpoint: var("S3_ENDPOINT"),
            local_storage_path: var("LOCAL_STORAGE_PATH"),
        };

        let provider = var("CAPTION_PROVIDER")
            .map(|s| s.parse())
            .transpose()?
            .unwrap_or(CaptionProvider::Gemini);
        let captioning = CaptioningConfig {
            provider,
            api_key: var(provider.api_key_var()),
            model: var("CAPTION_MODEL").unwrap_or_else(|| provider.default_model().to_string()),
            prompt: var("CAPTION_PROMPT").unwrap_or_else(|| DEFAULT_CAPTION_PROMPT.to_string()),
            max_tokens: var("CAPTION_MAX_TOKENS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(CAPTION_MAX_TOKENS),
            timeout_secs: var("CAPTION_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(CAPTION_TIMEOUT_SECS),
            api_base_url: var("CAPTION_API_BASE_URL"),
        };

        let database = DatabaseConfig {
            secret_name: var("SECRET_NAME"),
            secret_region: var("REGION").or(aws_region),
            connect_timeout_secs: var("DB_CONNECT_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(DB_CONNECT_TIMEOUT_SECS),
            table: var("CAPTION_TABLE").unwrap_or_else(|| CAPTION_TABLE.to_string()),
            caption_column: var("CAPTION_COLUMN").unwrap_or_else(|| CAPTION_COLUMN.to_string()),
            key_column: var("CAPTION_KEY_COLUMN")
                .unwrap_or_else(|| CAPTION_KEY_COLUMN.to_string()),
            missing_record_policy: var("MISSING_RECORD_POLICY")
                .map(|s| s.parse())
                .transpose()?
                .unwrap_or(MissingRecordPolicy::Fail),
        };

        let thumbnail = ThumbnailConfig {
            prefix: ReservedPrefix::new(
                var("THUMBNAIL_PREFIX").unwrap_or_else(|| DEFAULT_THUMBNAIL_PREFIX.to_string()),
            )?,
            max_dimension: var("THUMBNAIL_MAX_DIMENSION")
                .and_then(|s| s.parse().ok())
                .unwrap_or(THUMBNAIL_MAX_DIMENSION),
            jpeg_quality: var("THUMBNAIL_JPEG_QUALITY")
                .and_then(|s| s.parse().ok())
                .unwrap_or(THUMBNAIL_JPEG_QUALITY),
        };

        Ok(Self {
            environment,
            telemetry,
            storage,
            captioning,
            database,
            thumbnail,
        })
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        matches!(self.environment.to_lowercase().as_str(), "production" | "prod")
    }

    /// Validate the settings a given pipeline depends on.
    pub fn validate_for(&self, kind: PipelineKind) -> Result<(), anyhow::Error> {
        self.validate_storage()?;
        match kind {
            PipelineKind::Caption => self.validate_caption(),
            PipelineKind::Thumbnail => self.validate_thumbnail(),
        }
    }

    fn validate_storage(&self) -> Result<(), anyhow::Error> {
        match self.storage.backend {
            StorageBackend::S3 => {
                if self.storage.aws_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.storage.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
            }
        }
        Ok(())
    }

    fn validate_caption(&self) -> Result<(), anyhow::Error> {
        if self.database.secret_name.is_none() {
            return Err(anyhow::anyhow!("SECRET_NAME must be set for the caption pipeline"));
        }
        if self.database.secret_region.is_none() {
            return Err(anyhow::anyhow!(
                "REGION or AWS_REGION must be set to resolve database credentials"
            ));
        }
        if self.database.connect_timeout_secs == 0 {
            return Err(anyhow::anyhow!("DB_CONNECT_TIMEOUT_SECS must be greater than 0"));
        }
        for (name, value) in [
            ("CAPTION_TABLE", &self.database.table),
            ("CAPTION_COLUMN", &self.database.caption_column),
            ("CAPTION_KEY_COLUMN", &self.database.key_column),
        ] {
            if !is_sql_identifier(value) {
                return Err(anyhow::anyhow!(
                    "{} must be a plain SQL identifier, got {:?}",
                    name,
                    value
                ));
            }
        }

        let key_var = self.captioning.provider.api_key_var();
        match self.captioning.api_key.as_deref() {
            None => return Err(anyhow::anyhow!("{} must be set for captioning", key_var)),
            Some(key) if key.len() < 10 || key == "your-api-key" => {
                return Err(anyhow::anyhow!(
                    "{} appears to be invalid or a placeholder",
                    key_var
                ))
            }
            Some(_) => {}
        }
        if self.captioning.prompt.trim().is_empty() {
            return Err(anyhow::anyhow!("CAPTION_PROMPT must not be empty"));
        }
        if self.captioning.timeout_secs == 0 {
            return Err(anyhow::anyhow!("CAPTION_TIMEOUT_SECS must be greater than 0"));
        }
        Ok(())
    }

    fn validate_thumbnail(&self) -> Result<(), anyhow::Error> {
        if self.thumbnail.max_dimension == 0 {
            return Err(anyhow::anyhow!("THUMBNAIL_MAX_DIMENSION must be greater than 0"));
        }
        if !(1..=100).contains(&self.thumbnail.jpeg_quality) {
            return Err(anyhow::anyhow!("THUMBNAIL_JPEG_QUALITY must be between 1 and 100"));
        }
        Ok(())
    }
}

/// Table and column names are interpolated into SQL, so only plain identifiers pass.
pub fn is_sql_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    name.len() <= 64 && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
