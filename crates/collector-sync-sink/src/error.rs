//! Error types for collector delivery operations.
//!
//! The categories exist for operator diagnosis; the dispatcher treats every
//! one of them as the same retryable failure.

use thiserror::Error;

/// Error type for one delivery attempt.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The request did not complete within the per-attempt timeout.
    #[error("request timed out")]
    Timeout,

    /// Transport-level failure from reqwest (refused, reset, TLS, DNS).
    #[error("connection error: {0}")]
    Connection(#[from] reqwest::Error),

    /// The collector answered with a non-200 status.
    ///
    /// Contains the status code and response body for debugging.
    #[error("collector error: {status} - {body}")]
    Status {
        /// The HTTP status code returned by the collector.
        status: u16,
        /// The response body, typically containing error details.
        body: String,
    },

    /// The stored `data` column no longer parses as a JSON object.
    #[error("payload error: {0}")]
    Payload(#[from] serde_json::Error),
}

impl DeliveryError {
    /// Short category label used in logs.
    pub fn category(&self) -> &'static str {
        match self {
            DeliveryError::Timeout => "timeout",
            DeliveryError::Connection(_) => "connection",
            DeliveryError::Status { .. } => "status",
            DeliveryError::Payload(_) => "payload",
        }
    }
}

/// Convenience Result type alias for delivery operations.
pub type DeliveryResult<T> = Result<T, DeliveryError>;
