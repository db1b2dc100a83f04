//! Database credential resolution
//!
//! Credentials are read from the secret store on every invocation and never
//! cached, so rotated passwords take effect on the next event.

#[cfg(feature = "secrets-aws")]
mod aws;

#[cfg(feature = "secrets-aws")]
pub use aws::SecretsManagerSource;

use async_trait::async_trait;
use pixelhook_core::DbCredentials;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SecretError {
    #[error("Secret not found: {0}")]
    NotFound(String),

    #[error("Access denied to secret: {0}")]
    AccessDenied(String),

    #[error("Secret decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Secret has no string value: {0}")]
    BinarySecret(String),

    #[error("Invalid secret format: {0}")]
    InvalidFormat(String),

    #[error("Secret store error: {0}")]
    Sdk(String),
}

/// Anything that can hand back the string payload of a named secret
#[async_trait]
pub trait SecretSource: Send + Sync {
    async fn secret_string(&self, secret_id: &str) -> Result<String, SecretError>;
}

/// Fetches and parses [`DbCredentials`] from a [`SecretSource`].
#[derive(Clone)]
pub struct CredentialResolver {
    source: Arc<dyn SecretSource>,
}

impl CredentialResolver {
    pub fn new(source: Arc<dyn SecretSource>) -> Self {
        Self { source }
    }

    pub async fn resolve(&self, secret_id: &str) -> Result<DbCredentials, SecretError> {
        let payload = self.source.secret_string(secret_id).await?;

        let credentials: DbCredentials = serde_json::from_str(&payload).map_err(|e| {
            // serde_json errors carry positions only, never the payload
            SecretError::InvalidFormat(format!("{}: {}", secret_id, e))
        })?;

        tracing::debug!(
            secret_id = %secret_id,
            host = %credentials.host,
            port = credentials.port,
            dbname = %credentials.dbname,
            "Resolved database credentials"
        );

        Ok(credentials)
    }
}
