//! Error types for configuration and collaborators.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or validating the configuration file.
///
/// These are fatal at startup and never retried.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file does not exist.
    #[error("configuration file {0} not found; run `liveping init-config` to create an example")]
    NotFound(PathBuf),

    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file could not be written.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid JSON for the expected shape.
    #[error("invalid configuration: {0}")]
    Invalid(#[from] serde_json::Error),

    /// A required field is empty.
    #[error("field '{field}' in section '{section}' cannot be empty")]
    EmptyField {
        section: &'static str,
        field: &'static str,
    },

    /// The poll interval is below the allowed minimum.
    #[error("check_interval must be at least {min} seconds, got {actual}")]
    IntervalTooShort { min: u64, actual: u64 },

    /// Refused to overwrite an existing file.
    #[error("{0} already exists")]
    AlreadyExists(PathBuf),
}

/// Errors reported by external collaborators (status source, publisher,
/// preview fetcher).
///
/// The runtime treats every variant as an ordinary, non-fatal failure of the
/// current cycle or dispatch.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// Network failure or timeout.
    #[error("transport error: {0}")]
    Transport(String),

    /// The remote answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Authentication failed.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The response could not be understood.
    #[error("unexpected response: {0}")]
    Parse(String),

    /// The request was refused before being sent.
    #[error("rejected: {0}")]
    Rejected(String),
}

impl AdapterError {
    /// Returns true for HTTP 401 responses.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, AdapterError::Http { status: 401, .. })
    }
}

/// Result type for collaborator calls.
pub type Result<T> = std::result::Result<T, AdapterError>;
