//! Pixelhook Core Library
//!
//! This crate provides the domain models, notification parsing, key derivation,
//! error metadata and configuration shared by both upload pipelines.

pub mod config;
pub mod error;
pub mod event;
pub mod keys;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{
    CaptionProvider, CaptioningConfig, DatabaseConfig, MissingRecordPolicy, PipelineConfig,
    PipelineKind, StorageConfig, TelemetryConfig, ThumbnailConfig,
};
pub use error::{ErrorMetadata, LogLevel};
pub use event::{build_notification, parse_notification, EventError};
pub use keys::{derive_identifier, ReservedPrefix, DEFAULT_THUMBNAIL_PREFIX};
pub use models::{
    detect_media_type, Caption, DbCredentials, HandlerResponse, ImageBytes, UploadNotification,
};
pub use storage_types::StorageBackend;
