//! Error metadata shared by the pipeline crates
//!
//! Every error that can reach a pipeline boundary describes how it should be
//! reported: which status code the invocation returns, the message placed in the
//! response body, and the level it is logged at.

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Expected failures caused by the input (malformed envelopes)
    Debug,
    /// Recoverable or policy-driven outcomes
    Warn,
    /// Downstream failures
    Error,
}

/// Metadata for invocation responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// Status code returned to the invoking platform
    fn status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "FETCH_ERROR"), used as a log field
    fn error_code(&self) -> &'static str;

    /// Body returned to the invoking platform
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;

    /// Whether the platform's redelivery could plausibly succeed
    fn is_recoverable(&self) -> bool {
        self.status_code() >= 500
    }
}
