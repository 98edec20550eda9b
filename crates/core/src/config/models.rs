//! Configuration models: core settings and the fixed storage layout.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Placeholder substituted with the bucket name in the download URL.
pub const BUCKET_PLACEHOLDER: &str = "{{BUCKET_NAME}}";

const DEFAULT_DOWNLOAD_URL_TEMPLATE: &str =
    "https://storage.googleapis.com/{{BUCKET_NAME}}/releases/ps_unreal_plugin_processor.zip";
const DEFAULT_ENTRY_POINT: &str = "PixelStreamingUnrealEditorPluginProcessor.exe";

const SETTINGS_FILE: &str = "psgcp.toml";
const PROJECT_INFO_FILE: &str = "LastPSGCProjectInfo.json";
const DOWNLOAD_ZIP_FILE: &str = "ps_unreal_plugin_processor.zip";
const EXTRACT_DIR: &str = "ps_unreal_plugin_processor";
const PACKAGE_ZIP_FILE: &str = "ps_unreal_packaged_application.zip";

/// Tunables of the orchestration core, read from `psgcp.toml`.
///
/// Every field has a default, so a missing file or a partial file is fine:
///
/// ```toml
/// download_url_template = "https://storage.googleapis.com/{{BUCKET_NAME}}/releases/ps_unreal_plugin_processor.zip"
/// entry_point = "PixelStreamingUnrealEditorPluginProcessor.exe"
/// exit_status_delay_ms = 500
/// tick_interval_ms = 16
/// http_timeout_secs = 300
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreSettings {
    /// URL of the helper bundle; must contain `{{BUCKET_NAME}}`.
    pub download_url_template: String,

    /// File name of the executable expected inside the extracted bundle.
    pub entry_point: String,

    /// Delay between observing a process exit and reporting its status.
    pub exit_status_delay_ms: u64,

    /// Period of the host's cooperative tick loop.
    pub tick_interval_ms: u64,

    /// Overall timeout of the bundle download.
    pub http_timeout_secs: u64,
}

impl Default for CoreSettings {
    fn default() -> Self {
        Self {
            download_url_template: DEFAULT_DOWNLOAD_URL_TEMPLATE.to_string(),
            entry_point: DEFAULT_ENTRY_POINT.to_string(),
            exit_status_delay_ms: 500,
            tick_interval_ms: 16,
            http_timeout_secs: 300,
        }
    }
}

impl CoreSettings {
    pub fn exit_status_delay(&self) -> Duration {
        Duration::from_millis(self.exit_status_delay_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

/// Fixed, single-slot paths under the saved directory.
///
/// Only one download, extraction and package artifact exists at a time;
/// concurrent operations of the same kind must be serialized by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLayout {
    saved_dir: PathBuf,
}

impl StorageLayout {
    pub fn new(saved_dir: impl Into<PathBuf>) -> Self {
        Self {
            saved_dir: saved_dir.into(),
        }
    }

    pub fn saved_dir(&self) -> &Path {
        &self.saved_dir
    }

    pub fn settings_file(&self) -> PathBuf {
        self.saved_dir.join(SETTINGS_FILE)
    }

    pub fn project_info_file(&self) -> PathBuf {
        self.saved_dir.join(PROJECT_INFO_FILE)
    }

    pub fn download_zip(&self) -> PathBuf {
        self.saved_dir.join(DOWNLOAD_ZIP_FILE)
    }

    pub fn extract_dir(&self) -> PathBuf {
        self.saved_dir.join(EXTRACT_DIR)
    }

    /// Location of the entry point once the bundle has been extracted.
    pub fn entry_point(&self, settings: &CoreSettings) -> PathBuf {
        self.extract_dir().join(&settings.entry_point)
    }

    pub fn package_zip(&self) -> PathBuf {
        self.saved_dir.join(PACKAGE_ZIP_FILE)
    }
}
