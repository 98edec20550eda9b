//! Configuration loading and management.
//!
//! This module provides the fixed on-disk layout under the saved directory,
//! optional core settings from `psgcp.toml`, and the persisted project
//! record.

pub mod error;
pub mod loader;
pub mod models;
pub mod project_info;
