//! Pipeline error handling
//!
//! Every stage failure is converted into a [`PipelineError`] and reported once
//! at the pipeline boundary. Status codes, response bodies and log levels come
//! from one metadata table so both pipelines answer consistently.

use pixelhook_captioning::CaptionError;
use pixelhook_core::{ErrorMetadata, EventError, HandlerResponse, LogLevel, PipelineKind};
use pixelhook_db::PersistenceError;
use pixelhook_infra::SecretError;
use pixelhook_processing::{DecodeError, EncodeError};
use pixelhook_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid event format: {0}")]
    InvalidEvent(#[from] EventError),

    #[error("Failed to fetch image: {source}")]
    Fetch {
        pipeline: PipelineKind,
        source: StorageError,
    },

    #[error("Failed to decode image: {source}")]
    Decode {
        pipeline: PipelineKind,
        source: DecodeError,
    },

    #[error("Caption generation failed: {0}")]
    Caption(#[from] CaptionError),

    #[error("Secret retrieval failed: {0}")]
    SecretRetrieval(#[from] SecretError),

    #[error("Database connection failed: {0}")]
    Connect(#[source] PersistenceError),

    #[error("Failed to persist caption: {0}")]
    Persistence(#[source] PersistenceError),

    #[error("No caption record matches identifier {0}")]
    RecordNotFound(String),

    #[error("Failed to encode image: {source}")]
    Encode {
        pipeline: PipelineKind,
        source: EncodeError,
    },

    #[error("Failed to publish thumbnail: {0}")]
    Publish(#[source] StorageError),
}

/// (status_code, error_code, is_recoverable, log_level) per variant.
fn pipeline_error_static_metadata(err: &PipelineError) -> (u16, &'static str, bool, LogLevel) {
    match err {
        // Storage test events arrive when a subscription is created
        PipelineError::InvalidEvent(EventError::NoStorageRecords) => {
            (400, "INVALID_EVENT", false, LogLevel::Debug)
        }
        PipelineError::InvalidEvent(_) => (400, "INVALID_EVENT", false, LogLevel::Warn),
        PipelineError::Fetch { .. } => (500, "FETCH_ERROR", true, LogLevel::Error),
        PipelineError::Decode { .. } => (500, "DECODE_ERROR", false, LogLevel::Error),
        PipelineError::Caption(_) => (500, "CAPTION_ERROR", true, LogLevel::Error),
        PipelineError::SecretRetrieval(_) => (500, "SECRET_RETRIEVAL_ERROR", true, LogLevel::Error),
        PipelineError::Connect(_) => (500, "DATABASE_CONNECTION_ERROR", true, LogLevel::Error),
        PipelineError::Persistence(_) => (500, "PERSISTENCE_ERROR", true, LogLevel::Error),
        PipelineError::RecordNotFound(_) => (500, "RECORD_NOT_FOUND", true, LogLevel::Warn),
        PipelineError::Encode { .. } => (500, "ENCODE_ERROR", false, LogLevel::Error),
        PipelineError::Publish(_) => (500, "PUBLISH_ERROR", true, LogLevel::Error),
    }
}

/// Body prefix for image stage failures, which differs per pipeline
fn image_failure_message(pipeline: PipelineKind, detail: &dyn std::fmt::Display) -> String {
    match pipeline {
        PipelineKind::Caption => format!("Image processing failed: {}", detail),
        PipelineKind::Thumbnail => format!("Failed to generate thumbnail: {}", detail),
    }
}

impl ErrorMetadata for PipelineError {
    fn status_code(&self) -> u16 {
        pipeline_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        pipeline_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        pipeline_error_static_metadata(self).2
    }

    fn log_level(&self) -> LogLevel {
        pipeline_error_static_metadata(self).3
    }

    fn client_message(&self) -> String {
        match self {
            PipelineError::InvalidEvent(_) => "Invalid event format".to_string(),
            PipelineError::Fetch { pipeline, source } => image_failure_message(*pipeline, source),
            PipelineError::Decode { pipeline, source } => image_failure_message(*pipeline, source),
            PipelineError::Encode { pipeline, source } => image_failure_message(*pipeline, source),
            PipelineError::Caption(e) => format!("Caption generation failed: {}", e),
            PipelineError::SecretRetrieval(_) => "Secret retrieval failed".to_string(),
            PipelineError::Connect(_) => "Database connection failed".to_string(),
            PipelineError::Persistence(e) => format!("Failed to insert data into database: {}", e),
            PipelineError::RecordNotFound(id) => {
                format!("No caption record matches identifier {}", id)
            }
            PipelineError::Publish(e) => format!("Failed to generate thumbnail: {}", e),
        }
    }
}

impl PipelineError {
    /// Log the failure at its configured level and build the invocation response.
    pub fn into_response(self, pipeline: PipelineKind) -> HandlerResponse {
        let status = self.status_code();
        let code = self.error_code();
        let recoverable = self.is_recoverable();

        match self.log_level() {
            LogLevel::Debug => tracing::debug!(
                pipeline = %pipeline,
                error = %self,
                error_code = code,
                status_code = status,
                "Invocation rejected"
            ),
            LogLevel::Warn => tracing::warn!(
                pipeline = %pipeline,
                error = %self,
                error_code = code,
                status_code = status,
                recoverable = recoverable,
                "Invocation failed"
            ),
            LogLevel::Error => tracing::error!(
                pipeline = %pipeline,
                error = %self,
                error_code = code,
                status_code = status,
                recoverable = recoverable,
                "Invocation failed"
            ),
        }

        HandlerResponse::new(status, self.client_message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_event_is_client_error() {
        let err = PipelineError::from(EventError::NoRecords);
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.client_message(), "Invalid event format");
        assert!(!err.is_recoverable());
        assert_eq!(err.log_level(), LogLevel::Warn);
    }

    #[test]
    fn test_storage_test_event_logged_quietly() {
        let err = PipelineError::from(EventError::NoStorageRecords);
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.log_level(), LogLevel::Debug);
    }

    #[test]
    fn test_image_failure_body_depends_on_pipeline() {
        let caption = PipelineError::Fetch {
            pipeline: PipelineKind::Caption,
            source: StorageError::NotFound("uploads/dog.jpg".to_string()),
        };
        assert_eq!(
            caption.client_message(),
            "Image processing failed: Object not found: uploads/dog.jpg"
        );

        let thumbnail = PipelineError::Decode {
            pipeline: PipelineKind::Thumbnail,
            source: DecodeError::UnknownFormat,
        };
        assert_eq!(
            thumbnail.client_message(),
            "Failed to generate thumbnail: Unrecognized image format"
        );
    }

    #[test]
    fn test_credential_failures_hide_details() {
        let secret = PipelineError::from(SecretError::AccessDenied("prod/db".to_string()));
        assert_eq!(secret.status_code(), 500);
        assert_eq!(secret.client_message(), "Secret retrieval failed");

        let connect = PipelineError::Connect(PersistenceError::Connect("access denied for user".to_string()));
        assert_eq!(connect.client_message(), "Database connection failed");
    }

    #[test]
    fn test_record_not_found() {
        let err = PipelineError::RecordNotFound("dog".to_string());
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.error_code(), "RECORD_NOT_FOUND");
        assert_eq!(err.client_message(), "No caption record matches identifier dog");
    }

    #[test]
    fn test_into_response() {
        let response = PipelineError::Caption(CaptionError::EmptyCaption)
            .into_response(PipelineKind::Caption);
        assert_eq!(response.status_code, 500);
        assert_eq!(
            response.body,
            "Caption generation failed: Caption model returned no text"
        );
    }
}
