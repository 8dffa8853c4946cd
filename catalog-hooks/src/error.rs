//! Error types for hook dispatch.

use thiserror::Error;

/// Result type for deployment calls.
pub type HookResult<T> = Result<T, HookDispatchError>;

/// Errors raised while running a post-mutation side effect.
///
/// These never undo a committed mutation; they are reported next to it.
#[derive(Debug, Error)]
pub enum HookDispatchError {
    /// Transport-level failure talking to the deployment service.
    #[error("http error: {0}")]
    Http(String),

    /// The deployment service answered with a non-success status.
    #[error("deployment service returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Failure reported by a client implementation.
    #[error("deployment client error: {0}")]
    Client(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
