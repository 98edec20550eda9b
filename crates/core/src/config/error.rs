//! Error types for configuration loading and persistence.
//!
//! This module defines all errors that can occur while reading settings
//! files and writing the saved project record.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during configuration loading and saving.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read a configuration file from disk.
    #[error("Failed to read config file at {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to write a configuration file to disk.
    #[error("Failed to write config file at {path}: {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to parse TOML configuration.
    #[error("Failed to parse TOML file at {path}: {source}")]
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// Failed to serialize a record to JSON.
    #[error("Failed to serialize {path}: {source}")]
    JsonSerialize {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Settings parsed but hold values the core cannot use.
    #[error("Invalid configuration in {path}: {reason}")]
    InvalidConfig { path: PathBuf, reason: String },
}

/// Type alias for Result with ConfigError.
pub type ConfigResult<T> = Result<T, ConfigError>;
