//! Error types for the runtime crate.

use thiserror::Error;

/// Errors that can occur in the runtime.
///
/// Collaborator failures never show up here; they are reported as
/// `CycleReport` / `DispatchOutcome` values instead.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// A required collaborator was not provided to the builder.
    #[error("missing collaborator: {0}")]
    MissingCollaborator(&'static str),

    /// Runtime not started.
    #[error("runtime not started")]
    NotStarted,

    /// Runtime already started.
    #[error("runtime already started")]
    AlreadyStarted,

    /// Shutdown error.
    #[error("shutdown error: {0}")]
    Shutdown(String),
}

/// Result type for runtime operations.
pub type Result<T> = std::result::Result<T, RuntimeError>;
