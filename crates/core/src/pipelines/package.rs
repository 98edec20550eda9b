//! Compress a build output directory into the package archive.

use crate::archive::{ArchiveCodec, ArchiveError};
use crate::config::models::StorageLayout;
use crate::pipelines::{absolute_path, cancelled};
use psgcp_protocol::result_models::{ArtifactResult, FailureReason};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Absolute form of a user-selected directory, without trailing separators.
pub fn normalize_source_dir(path: &Path) -> PathBuf {
    absolute_path(path).components().collect()
}

/// Packages build output into the layout's package zip.
pub struct PackagePipeline {
    layout: StorageLayout,
    codec: Arc<dyn ArchiveCodec>,
}

impl PackagePipeline {
    pub fn new(layout: StorageLayout, codec: Arc<dyn ArchiveCodec>) -> Self {
        Self { layout, codec }
    }

    /// Compress the whole tree under `source` on the blocking pool.
    ///
    /// On success the result carries the archive's absolute path. On failure
    /// no partial archive is left behind.
    pub async fn package_directory(
        &self,
        source: &Path,
        cancel: &CancellationToken,
    ) -> ArtifactResult {
        let codec = Arc::clone(&self.codec);
        let layout = self.layout.clone();
        let source = source.to_path_buf();
        let token = cancel.clone();

        match tokio::task::spawn_blocking(move || {
            package_blocking(codec.as_ref(), &layout, &source, &token)
        })
        .await
        {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "packaging task failed");
                remove_partial(&self.layout.package_zip());
                ArtifactResult::failed(FailureReason::Archive, e.to_string())
            }
        }
    }
}

fn package_blocking(
    codec: &dyn ArchiveCodec,
    layout: &StorageLayout,
    source: &Path,
    cancel: &CancellationToken,
) -> ArtifactResult {
    let missing = || {
        ArtifactResult::failed(
            FailureReason::MissingSource,
            format!("Directory does not exist at {}", source.display()),
        )
    };
    if !source.is_dir() {
        return missing();
    }
    let Ok(source) = source.canonicalize() else {
        return missing();
    };

    if let Err(e) = std::fs::create_dir_all(layout.saved_dir()) {
        return ArtifactResult::failed(FailureReason::Persistence, e.to_string());
    }
    let saved_dir = match layout.saved_dir().canonicalize() {
        Ok(dir) => dir,
        Err(e) => return ArtifactResult::failed(FailureReason::Persistence, e.to_string()),
    };
    let layout = StorageLayout::new(&saved_dir);

    let zip_path = layout.package_zip();
    remove_partial(&zip_path);

    // Earlier artifacts and the project record stay out of the package
    let mut exclude = Vec::new();
    if saved_dir != source && saved_dir.starts_with(&source) {
        exclude.push(saved_dir.as_path());
    }

    info!(?source, ?zip_path, "packaging directory");
    match codec.compress_dir(&source, &zip_path, &exclude, cancel) {
        Ok(()) => {
            info!(?zip_path, "package ready");
            ArtifactResult::succeeded(zip_path)
        }
        Err(ArchiveError::Cancelled) => {
            remove_partial(&zip_path);
            cancelled()
        }
        Err(e) => {
            warn!(error = %e, "packaging failed");
            remove_partial(&zip_path);
            ArtifactResult::failed(FailureReason::Archive, e.to_string())
        }
    }
}

fn remove_partial(path: &Path) {
    if path.exists() {
        if let Err(e) = std::fs::remove_file(path) {
            warn!(?path, error = %e, "failed to remove partial archive");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_trailing_separator() {
        let normalized = normalize_source_dir(Path::new("/builds/Windows/"));
        assert_eq!(normalized, PathBuf::from("/builds/Windows"));
    }

    #[test]
    fn test_normalize_makes_relative_absolute() {
        let normalized = normalize_source_dir(Path::new("builds"));
        assert!(normalized.is_absolute());
        assert!(normalized.ends_with("builds"));
    }
}
