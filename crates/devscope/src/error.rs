//! Error types for devscope.

use thiserror::Error;

/// Errors that can occur while configuring devscope.
///
/// Instrumentation itself never fails: unknown groups are ignored and
/// failures of watched functions are passed through untouched. Only setup
/// has a fallible surface.
#[derive(Debug, Error)]
pub enum ScopeError {
    /// Configuration could not be parsed
    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),

    /// A slow threshold that cannot be represented as a duration
    #[error("Invalid slow threshold: {0}ms")]
    InvalidThreshold(f64),

    /// Tracing filter directive was rejected
    #[error("Invalid log filter: {0}")]
    InvalidFilter(String),

    /// A global tracing subscriber is already installed
    #[error("Tracing subscriber already initialized")]
    LoggingInit,
}

/// Result type for devscope setup operations.
pub type ScopeResult<T> = Result<T, ScopeError>;
