//! Unified error types for the gcli2api helper.

use serde::Serialize;
use thiserror::Error;

/// Main error type for all helper operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum HelperError {
    /// Upstream could not be reached (connect failure or timeout).
    #[error("Upstream unreachable: {0}")]
    Unreachable(String),

    /// Upstream answered with a non-2xx status.
    #[error("Upstream rejected request ({status}): {message}")]
    Rejected {
        /// HTTP status code returned by the upstream.
        status: u16,
        /// Error body or reason phrase from the upstream.
        message: String,
    },

    /// A verification sweep is already in flight.
    #[error("A verification sweep is already running")]
    AlreadyRunning,

    /// Credential mode does not expose per-model quota data.
    #[error("Quota not supported for credential: {0}")]
    QuotaUnsupported(String),

    /// Unknown credential referenced by a manual operation.
    #[error("Credential not found: {id}")]
    NotFound {
        /// Upstream-assigned credential identifier.
        id: String,
    },

    /// Upstream returned a body the helper could not parse.
    #[error("Invalid upstream response: {0}")]
    InvalidResponse(String),

    /// File system I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration loading or validation failed.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl HelperError {
    /// Check if this error is expected upstream flakiness that the next
    /// scheduled sweep may resolve on its own.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Unreachable(_) | Self::Rejected { .. })
    }
}

impl Serialize for HelperError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.to_string().as_str())
    }
}

/// Result type alias for helper operations.
pub type HelperResult<T> = Result<T, HelperError>;
