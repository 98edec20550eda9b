//! Persistence of the last-used Google Cloud project record.

use crate::config::error::{ConfigError, ConfigResult};
use psgcp_protocol::project_models::{ProjectInfo, SavedProjectFile};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Reads and writes [`ProjectInfo`] at a fixed path.
#[derive(Debug, Clone)]
pub struct ProjectInfoStore {
    path: PathBuf,
}

impl ProjectInfoStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Serialize `info` and overwrite the saved file.
    pub fn save(&self, info: &ProjectInfo) -> ConfigResult<()> {
        let json = serde_json::to_string(&SavedProjectFile::from(info.clone())).map_err(
            |source| ConfigError::JsonSerialize {
                path: self.path.clone(),
                source,
            },
        )?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::FileWrite {
                path: self.path.clone(),
                source,
            })?;
        }

        std::fs::write(&self.path, json).map_err(|source| ConfigError::FileWrite {
            path: self.path.clone(),
            source,
        })?;

        debug!(path = ?self.path, "saved project info");
        Ok(())
    }

    /// Load the saved record.
    ///
    /// Fails closed: a file that cannot be read, is not JSON, or lacks any of
    /// the six string fields is deleted and `None` is returned. Partial data
    /// is never returned.
    pub fn load(&self) -> Option<ProjectInfo> {
        if !self.path.is_file() {
            return None;
        }

        let parsed = std::fs::read_to_string(&self.path)
            .map_err(|e| e.to_string())
            .and_then(|content| {
                serde_json::from_str::<SavedProjectFile>(&content).map_err(|e| e.to_string())
            });

        match parsed {
            Ok(saved) => Some(saved.gc_project_info),
            Err(reason) => {
                warn!(path = ?self.path, %reason, "discarding unreadable project info");
                if let Err(e) = std::fs::remove_file(&self.path) {
                    warn!(path = ?self.path, error = %e, "failed to delete project info");
                }
                None
            }
        }
    }
}
