//! Artifact pipelines run on background tasks.
//!
//! - [`fetch`]: download the helper bundle, extract it, validate the entry point
//! - [`package`]: compress a build output directory into one archive
//!
//! Each run yields exactly one `ArtifactResult`. A failing step removes the
//! partial files it produced before reporting.

pub mod fetch;
pub mod package;

pub use fetch::FetchPipeline;
pub use package::PackagePipeline;

use psgcp_protocol::result_models::{ArtifactResult, FailureReason};
use std::path::{Path, PathBuf};
use tracing::warn;

/// `path` made absolute against the current directory.
pub(crate) fn absolute_path(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

pub(crate) fn cancelled() -> ArtifactResult {
    ArtifactResult::failed(FailureReason::Cancelled, "Operation was cancelled.")
}

pub(crate) async fn remove_file_if_exists(path: &Path) {
    if tokio::fs::try_exists(path).await.unwrap_or(false) {
        if let Err(e) = tokio::fs::remove_file(path).await {
            warn!(?path, error = %e, "failed to remove file");
        }
    }
}

pub(crate) async fn remove_dir_if_exists(path: &Path) {
    if tokio::fs::try_exists(path).await.unwrap_or(false) {
        if let Err(e) = tokio::fs::remove_dir_all(path).await {
            warn!(?path, error = %e, "failed to remove directory");
        }
    }
}
