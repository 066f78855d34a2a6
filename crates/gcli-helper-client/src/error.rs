//! Error types for the upstream client.

use thiserror::Error;

/// Errors that can occur when talking to the upstream credential proxy.
#[derive(Error, Debug)]
pub enum UpstreamError {
    /// The upstream could not be reached (connect failure or timeout).
    #[error("Upstream unreachable: {0}")]
    Unreachable(String),

    /// The upstream answered with a non-2xx status.
    #[error("Upstream rejected request ({status}): {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Error body or reason phrase.
        message: String,
    },

    /// The upstream does not know the referenced credential.
    #[error("Credential not found: {id}")]
    NotFound {
        /// Credential identifier.
        id: String,
    },

    /// The upstream returned a body that could not be parsed.
    #[error("Invalid upstream response: {0}")]
    InvalidResponse(String),
}

impl UpstreamError {
    /// Classify a reqwest transport error: connect and timeout failures
    /// mean the upstream is unreachable, anything else is a bad response.
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            Self::Unreachable(err.to_string())
        } else if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else {
            Self::Unreachable(err.to_string())
        }
    }
}

impl From<UpstreamError> for gcli_helper_types::HelperError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::Unreachable(msg) => Self::Unreachable(msg),
            UpstreamError::Rejected { status, message } => Self::Rejected { status, message },
            UpstreamError::NotFound { id } => Self::NotFound { id },
            UpstreamError::InvalidResponse(msg) => Self::InvalidResponse(msg),
        }
    }
}
