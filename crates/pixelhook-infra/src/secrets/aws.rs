use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_secretsmanager::config::Region;
use aws_sdk_secretsmanager::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_secretsmanager::Client as SecretsClient;

use super::{SecretError, SecretSource};

/// AWS Secrets Manager backed [`SecretSource`]
///
/// Uses credentials from the default provider chain (the execution role when
/// running inside the function runtime).
#[derive(Clone, Debug)]
pub struct SecretsManagerSource {
    client: SecretsClient,
}

impl SecretsManagerSource {
    pub async fn new(region: &str) -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;

        tracing::info!(region = %region, "Initialized AWS Secrets Manager client");

        Self::from_client(SecretsClient::new(&config))
    }

    pub fn from_client(client: SecretsClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SecretSource for SecretsManagerSource {
    async fn secret_string(&self, secret_id: &str) -> Result<String, SecretError> {
        let start = std::time::Instant::now();

        let response = self
            .client
            .get_secret_value()
            .secret_id(secret_id)
            .send()
            .await
            .map_err(|e| {
                let message = DisplayErrorContext(&e).to_string();
                let service_error = e.into_service_error();
                let error = if service_error.is_resource_not_found_exception() {
                    SecretError::NotFound(secret_id.to_string())
                } else if service_error.is_decryption_failure() {
                    SecretError::DecryptionFailed(secret_id.to_string())
                } else if service_error.code() == Some("AccessDeniedException") {
                    SecretError::AccessDenied(secret_id.to_string())
                } else {
                    SecretError::Sdk(message)
                };
                tracing::error!(
                    secret_id = %secret_id,
                    error = %error,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Secret retrieval failed"
                );
                error
            })?;

        let secret_string = response
            .secret_string()
            .ok_or_else(|| SecretError::BinarySecret(secret_id.to_string()))?
            .to_string();

        tracing::debug!(
            secret_id = %secret_id,
            version_id = ?response.version_id(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Secret retrieved from AWS Secrets Manager"
        );

        Ok(secret_string)
    }
}
