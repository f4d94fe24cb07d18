use crate::host::HostError;
use thiserror::Error;

/// Errors raised by a drawing session.
///
/// Every variant is fatal to the session that produced it: it unwinds to the
/// runner, which logs it and aborts. Advisory conditions are logged with
/// `tracing::warn!` instead and never reach this type.
#[derive(Error, Debug)]
pub enum SketchError {
    /// Malformed input the session cannot build from (bad grouped vertex count,
    /// missing transform arguments).
    #[error("Validation error: {0}")]
    Validation(String),
    /// Operation issued in a state that cannot honor it (e.g. `pop_matrix` on an empty stack).
    #[error("State error: {0}")]
    State(String),
    /// No call form matches the supplied arguments.
    #[error("Argument error: {0}")]
    Argument(String),
    #[error(transparent)]
    Host(#[from] HostError),
    /// Failure inside a user script (compile or runtime).
    #[error("Script error: {0}")]
    Script(String),
}

/// Result type for session operations.
pub type SketchResult<T> = Result<T, SketchError>;

impl SketchError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub(crate) fn state(msg: impl Into<String>) -> Self {
        Self::State(msg.into())
    }

    pub(crate) fn argument(msg: impl Into<String>) -> Self {
        Self::Argument(msg.into())
    }
}
