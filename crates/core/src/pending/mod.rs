//! Pending operations shared between background tasks and the main context.
//!
//! This module provides:
//! - `CompletionHandle`, the reference-counted, atomically updated state a
//!   background task reports through
//! - `PendingRegistry`, which keys operations by caller and call site and
//!   resumes continuations on every tick of the main context

pub mod completion;
pub mod registry;

pub use completion::CompletionHandle;
pub use registry::{PendingOperation, PendingRegistry, Resolved, Resumption};
