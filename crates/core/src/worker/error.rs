//! Error types for worker supervision and command dispatch.

use thiserror::Error;

/// Failure to turn a command into its wire form.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Failed to encode command: {0}")]
    Encode(String),
}

/// Failure to deliver a command to the worker.
///
/// Reported per call; never changes the supervisor's lifecycle state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// There is no live worker input stream to write to.
    #[error("No worker process is running")]
    NoWorker,

    /// Writing to the worker's input stream failed (e.g. broken pipe).
    #[error("Failed to write to worker: {0}")]
    Write(String),

    #[error(transparent)]
    Encode(#[from] CodecError),
}

/// Errors reported by the process supervisor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SupervisorError {
    /// The worker program could not be located. No process was created.
    #[error("Worker program '{program}' is unavailable: {reason}")]
    Unavailable { program: String, reason: String },

    /// The OS refused to create the worker process.
    #[error("Failed to spawn worker '{program}': {reason}")]
    Spawn { program: String, reason: String },

    /// A worker is already live; only one may exist at a time.
    #[error("Worker is already running")]
    AlreadyRunning,
}
