//! Settings loader for `psgcp.toml`.

use crate::config::error::{ConfigError, ConfigResult};
use crate::config::models::{CoreSettings, BUCKET_PLACEHOLDER};
use std::path::Path;

/// Loads core settings from a TOML file.
///
/// # Arguments
///
/// * `path` - Path to the settings file, usually `StorageLayout::settings_file()`
///
/// # Returns
///
/// The parsed settings. Missing keys take their defaults, and a missing file
/// yields `CoreSettings::default()` rather than an error.
///
/// # Errors
///
/// Returns `ConfigError` if:
/// - The file exists but cannot be read
/// - The file is not valid TOML
/// - The download URL template lacks the bucket placeholder
/// - The entry point is empty, or the tick interval or HTTP timeout is zero
pub fn load_settings(path: &Path) -> ConfigResult<CoreSettings> {
    if !path.exists() {
        return Ok(CoreSettings::default());
    }

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let settings: CoreSettings =
        toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
            path: path.to_path_buf(),
            source,
        })?;

    if !settings.download_url_template.contains(BUCKET_PLACEHOLDER) {
        return Err(ConfigError::InvalidConfig {
            path: path.to_path_buf(),
            reason: format!("download_url_template must contain {BUCKET_PLACEHOLDER}"),
        });
    }

    if settings.entry_point.trim().is_empty() {
        return Err(ConfigError::InvalidConfig {
            path: path.to_path_buf(),
            reason: "entry_point must not be empty".to_string(),
        });
    }

    if settings.tick_interval_ms == 0 {
        return Err(ConfigError::InvalidConfig {
            path: path.to_path_buf(),
            reason: "tick_interval_ms must be greater than zero".to_string(),
        });
    }

    if settings.http_timeout_secs == 0 {
        return Err(ConfigError::InvalidConfig {
            path: path.to_path_buf(),
            reason: "http_timeout_secs must be greater than zero".to_string(),
        });
    }

    Ok(settings)
}
