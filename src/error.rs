//! Crate-wide error type
//!
//! Every fallible operation in the pipeline reports one of these variants.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while capturing gestures or persisting tasks
#[derive(Error, Debug)]
pub enum WaterflowError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Transport unavailable: {0}")]
    TransportUnavailable(String),

    #[error("Corrupt record at line {line}: {reason}")]
    CorruptRecord { line: usize, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Platform error: {0}")]
    PlatformError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Shutdown did not complete within {0:?}")]
    ShutdownTimeout(Duration),
}

/// Result type for pipeline operations
pub type WaterflowResult<T> = Result<T, WaterflowError>;
