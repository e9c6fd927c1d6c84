//! Error types for the telemetry shipper

use thiserror::Error;

/// Errors that can occur at the shipper's seams: configuration and delivery.
///
/// None of these ever reach callers of the logging operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Transport-level HTTP failure
    #[error("collector request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Collector URL could not be parsed
    #[error("invalid collector url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Failed to serialize a batch
    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Collector answered with a non-success status
    #[error("collector rejected batch with status {0}")]
    Status(reqwest::StatusCode),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
