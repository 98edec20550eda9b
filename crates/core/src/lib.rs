//! # psgcp-core
//!
//! Asynchronous external-task core for the Pixel Streaming GCP tooling.
//!
//! This crate provides:
//! - A registry of pending operations resumed from a single main context
//! - Child process sessions with streamed output
//! - Download, extraction and packaging pipelines for helper artifacts
//! - Configuration and persisted project info
//!
//! ## Modules
//!
//! - [`archive`]: Zip extraction and compression behind a codec trait
//! - [`config`]: Settings, storage layout and the project info store
//! - [`encoding`]: Hex encoding for command line values
//! - [`pending`]: Completion handles and the pending-operation registry
//! - [`pipelines`]: Bundle fetch and directory packaging
//! - [`process`]: Process sessions
//! - [`scheduler`]: The main scheduling context

pub mod archive;
pub mod config;
pub mod encoding;
pub mod pending;
pub mod pipelines;
pub mod process;
pub mod scheduler;
