//! Error types for the Twitch client.

use liveping_core::AdapterError;
use thiserror::Error;

/// Errors that can occur talking to Twitch.
#[derive(Debug, Error)]
pub enum TwitchError {
    /// Could not obtain an app access token.
    #[error("token request failed: {0}")]
    Auth(String),

    /// Helix answered with a non-success status.
    #[error("Helix API error {status}: {body}")]
    Api { status: u16, body: String },

    /// HTTP request error (connect, timeout, TLS).
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Response body did not have the expected shape.
    #[error("unexpected response: {0}")]
    Parse(String),
}

/// Result type for Twitch operations.
pub type Result<T> = std::result::Result<T, TwitchError>;

impl From<reqwest::Error> for TwitchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            TwitchError::Parse(e.to_string())
        } else {
            TwitchError::HttpError(e.to_string())
        }
    }
}

impl From<TwitchError> for AdapterError {
    fn from(e: TwitchError) -> Self {
        match e {
            TwitchError::Auth(msg) => AdapterError::Auth(msg),
            TwitchError::Api { status, body } => AdapterError::Http { status, body },
            TwitchError::HttpError(msg) => AdapterError::Transport(msg),
            TwitchError::Parse(msg) => AdapterError::Parse(msg),
        }
    }
}
