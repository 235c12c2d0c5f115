//! Error types for the Bluesky crate.

use liveping_core::AdapterError;
use thiserror::Error;

/// Errors that can occur talking to a PDS or fetching previews.
#[derive(Debug, Error)]
pub enum BlueskyError {
    /// Login failed.
    #[error("login failed: {0}")]
    Auth(String),

    /// XRPC call answered with a non-success status.
    #[error("XRPC error {status}: {body}")]
    Api { status: u16, body: String },

    /// HTTP request error.
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Response could not be understood.
    #[error("unexpected response: {0}")]
    Parse(String),

    /// Post text is over the length limit.
    #[error("post is {len} characters, limit is {max}")]
    TooLong { len: usize, max: usize },

    /// URL could not be parsed.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Result type for Bluesky operations.
pub type Result<T> = std::result::Result<T, BlueskyError>;

impl From<reqwest::Error> for BlueskyError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            BlueskyError::Parse(e.to_string())
        } else {
            BlueskyError::HttpError(e.to_string())
        }
    }
}

impl From<BlueskyError> for AdapterError {
    fn from(e: BlueskyError) -> Self {
        match e {
            BlueskyError::Auth(msg) => AdapterError::Auth(msg),
            BlueskyError::Api { status, body } => AdapterError::Http { status, body },
            BlueskyError::HttpError(msg) => AdapterError::Transport(msg),
            BlueskyError::Parse(msg) => AdapterError::Parse(msg),
            e @ BlueskyError::TooLong { .. } => AdapterError::Rejected(e.to_string()),
            e @ BlueskyError::InvalidUrl(_) => AdapterError::Rejected(e.to_string()),
        }
    }
}
