//! Error types for protocol operations

use reqwest::StatusCode;
use splice_formats::{ChunkGuid, FormatError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status: {0}")]
    HttpStatus(StatusCode),

    #[error("Server error: {0}")]
    ServerError(StatusCode),

    #[error("Timeout")]
    Timeout,

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("No chunk store base URLs configured")]
    NoEndpoints,

    #[error("Chunk {guid} unusable: {source}")]
    Chunk {
        guid: ChunkGuid,
        #[source]
        source: FormatError,
    },

    #[error("Requested chunk {requested} but store returned {received}")]
    GuidMismatch {
        requested: ChunkGuid,
        received: ChunkGuid,
    },

    #[error("Format error: {0}")]
    Format(#[from] FormatError),
}

impl ProtocolError {
    /// Classify a transport error, separating out timeouts
    pub fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(error)
        }
    }

    /// Check if error is retryable
    pub fn should_retry(&self) -> bool {
        match self {
            // Transient errors that should be retried
            Self::ServerError(_) | Self::Timeout => true,
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_body(),
            Self::HttpStatus(status) => {
                matches!(
                    status,
                    &StatusCode::TOO_MANY_REQUESTS | &StatusCode::REQUEST_TIMEOUT
                )
            }
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ProtocolError>;
