//! Pixelhook Infrastructure Library
//!
//! Shared infrastructure for the pipeline binaries:
//! - Telemetry initialization (tracing subscriber)
//! - Database credential resolution from a secret store

#[cfg(feature = "observability-basic")]
pub mod telemetry;

pub mod secrets;

// Re-export commonly used types
#[cfg(feature = "secrets-aws")]
pub use secrets::SecretsManagerSource;
pub use secrets::{CredentialResolver, SecretError, SecretSource};
#[cfg(feature = "observability-basic")]
pub use telemetry::init_telemetry;
