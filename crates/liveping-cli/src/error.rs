//! Error types for the CLI.

use liveping_bluesky::BlueskyError;
use liveping_core::ConfigError;
use liveping_runtime::RuntimeError;
use liveping_twitch::TwitchError;
use thiserror::Error;

/// Errors that end the process.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Runtime lifecycle error.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// Twitch client could not be created.
    #[error(transparent)]
    Twitch(#[from] TwitchError),

    /// Bluesky client could not be created.
    #[error(transparent)]
    Bluesky(#[from] BlueskyError),

    /// A connection test failed.
    #[error("connection test failed: {0}")]
    ConnectionTest(String),

    /// A manual post could not be published.
    #[error("post failed: {0}")]
    Publish(String),

    /// Logging could not be initialised.
    #[error("failed to initialise logging: {0}")]
    Logging(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Returns true if this error came from the configuration file.
    pub fn is_config(&self) -> bool {
        matches!(self, CliError::Config(_))
    }
}

/// Result type for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;
