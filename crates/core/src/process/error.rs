//! Error types for process sessions.

use thiserror::Error;

/// Errors reported synchronously by session operations.
///
/// Failures after a successful launch (decode errors, exit code retrieval)
/// degrade to best-effort values and never surface here.
#[derive(Error, Debug)]
pub enum ProcessError {
    /// No program was given.
    #[error("Program path is empty")]
    EmptyProgram,

    /// The OS refused to create the process or its pipes.
    #[error("Failed to spawn command '{program}': {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    /// A pipe requested at spawn time was not handed back.
    #[error("Failed to capture {0}")]
    PipeUnavailable(&'static str),

    /// An operation for the same caller and call site is still pending.
    #[error("A process is already pending for {0}")]
    AlreadyPending(String),

    /// The session was terminated or its input was closed.
    #[error("Session has been terminated")]
    Terminated,

    /// Writing to the process input failed.
    #[error("Failed to write to process input: {0}")]
    Write(#[source] std::io::Error),
}
