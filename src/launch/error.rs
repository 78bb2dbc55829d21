use std::io;

use thiserror::Error;

/// Fatal launch failures. GPU detection and status-reader problems are
/// deliberately absent: both degrade instead of aborting the session.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// A required executable could not be resolved on the search path.
    #[error("required tool not found: {0}")]
    MissingTool(String),

    /// The container engine never reported ready within its start budget.
    #[error("container runtime unavailable: {0}")]
    RuntimeUnavailable(String),

    /// A bounded wait (model install, HTTP readiness) exhausted its attempts.
    #[error("timed out waiting for {what}")]
    Timeout { what: String },

    /// A subprocess exited non-zero.
    #[error("command failed: {command} (exit code {code:?})")]
    CommandFailed { command: String, code: Option<i32> },

    /// A subprocess could not be spawned at all.
    #[error("failed to spawn {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
