//! Error types for the launch and attach pipeline.

use thiserror::Error;

/// Result alias used throughout the launcher crates.
pub type LaunchResult<T> = Result<T, LaunchError>;

/// Errors raised while launching a runtime process and attaching a REPL
/// session to it.
///
/// The taxonomy mirrors the phases of a launch: spawning the process,
/// waiting for its ack, refreshing the workspace, and attaching the
/// session. Cancellation is a first-class error so callers can map it to
/// a non-OK status without string matching.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// The runtime process could not be spawned.
    #[error("launch error: {0}")]
    Launch(String),

    /// The ack channel produced nothing within the allowed time.
    #[error("ack timeout: {0}")]
    AckTimeout(String),

    /// The wait was cancelled before an ack arrived.
    #[error("cancelled: {0}")]
    Cancelled(String),

    /// A session could not be established from a valid ack token.
    #[error("attach error: {0}")]
    Attach(String),

    /// The pre-attach workspace refresh step errored.
    #[error("refresh error: {0}")]
    Refresh(String),

    /// Invalid launch configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Operation is not valid for the current launch phase.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Unexpected internal error.
    #[error("internal error: {0}")]
    Internal(String),
}
