//! Domain error types
//!
//! This module defines the error hierarchy for the anonymizer.
//! All errors are domain-specific and don't expose third-party types.

use thiserror::Error;

/// Main anonymizer error type
///
/// This is the primary error type used throughout the application.
/// Recoverable per-item conditions (unknown type, missing field) are reported
/// and skipped by the run orchestrator; everything that reaches this type
/// propagates to the caller.
#[derive(Debug, Error)]
pub enum AnonymizerError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Database-related errors (query or persistence failure)
    #[error("Database error: {0}")]
    Database(String),

    /// Binary resource errors (unreadable dummy asset, failed import)
    #[error("Resource error: {0}")]
    Resource(String),

    /// Checkpoint bookkeeping errors
    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

// Conversion from std::io::Error
impl From<std::io::Error> for AnonymizerError {
    fn from(err: std::io::Error) -> Self {
        AnonymizerError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for AnonymizerError {
    fn from(err: serde_json::Error) -> Self {
        AnonymizerError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for AnonymizerError {
    fn from(err: toml::de::Error) -> Self {
        AnonymizerError::Configuration(format!("TOML parse error: {err}"))
    }
}

impl From<tokio_postgres::Error> for AnonymizerError {
    fn from(err: tokio_postgres::Error) -> Self {
        AnonymizerError::Database(err.to_string())
    }
}
