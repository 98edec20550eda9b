//! # psgcp-protocol
//!
//! Shared data models for the psgcp orchestration core.
//!
//! This crate defines the structures exchanged between the core and its
//! host (the CLI, or any embedding UI):
//! - The persisted Google Cloud project record
//! - Results of the fetch and packaging pipelines
//! - Process session events
//! - Pending-operation identity, status and resumption descriptors
//!
//! ## Modules
//!
//! - [`project_models`]: Saved project information
//! - [`result_models`]: Artifact results and failure reasons
//! - [`process_models`]: Process session events and metadata
//! - [`operation_models`]: Operation keys, continuations and resume kinds
//!
//! ## Design Principles
//!
//! - Minimal dependencies: Only serde, ts-rs, uuid and chrono
//! - TypeScript generation: All types derive `TS` for client compatibility
//! - Independent compilation: No dependencies on other psgcp crates

pub mod operation_models;
pub mod process_models;
pub mod project_models;
pub mod result_models;

// Re-export all public types for convenience
pub use operation_models::*;
pub use process_models::*;
pub use project_models::*;
pub use result_models::*;
