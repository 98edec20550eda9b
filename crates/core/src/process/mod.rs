//! External process sessions.
//!
//! This module provides:
//! - `CommandLine`, a program plus individually quoted arguments
//! - `ProcessSession`, a launched child whose output is streamed through a
//!   `CompletionHandle` by a background task

pub mod command_line;
pub mod error;
pub mod session;

pub use command_line::CommandLine;
pub use error::ProcessError;
pub use session::{ProcessSession, SessionOptions};
