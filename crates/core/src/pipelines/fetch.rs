//! Download, extract and validate the helper bundle.

use crate::archive::{ArchiveCodec, ArchiveError};
use crate::config::models::{CoreSettings, StorageLayout, BUCKET_PLACEHOLDER};
use crate::pipelines::{absolute_path, cancelled, remove_dir_if_exists, remove_file_if_exists};
use psgcp_protocol::result_models::{ArtifactResult, FailureReason};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const RESPONSE_INVALID: &str = "Response is invalid.";
const SAVE_FAILED: &str = "Failed to save the file.";
const EXTRACTION_FAILED: &str = "Zip extraction has failed.";
const ENTRY_POINT_MISSING: &str =
    "Zip file has been downloaded, extracted; but the exe file could not be found.";

/// Substitute `bucket` into the download URL template.
pub fn download_url(template: &str, bucket: &str) -> String {
    template.replace(BUCKET_PLACEHOLDER, bucket)
}

/// Fetches the helper bundle from a bucket into the storage layout.
pub struct FetchPipeline {
    client: reqwest::Client,
    layout: StorageLayout,
    settings: CoreSettings,
    codec: Arc<dyn ArchiveCodec>,
}

impl FetchPipeline {
    pub fn new(
        client: reqwest::Client,
        layout: StorageLayout,
        settings: CoreSettings,
        codec: Arc<dyn ArchiveCodec>,
    ) -> Self {
        Self {
            client,
            layout,
            settings,
            codec,
        }
    }

    /// Download the bundle of `bucket`, extract it and locate the entry point.
    ///
    /// Steps, each terminal on failure:
    /// 1. GET the bucket's bundle URL
    /// 2. Overwrite the download zip with the response body
    /// 3. Replace the extraction directory with the zip's contents
    /// 4. Check the entry point exists under the extraction directory
    ///
    /// On success the result carries the entry point's absolute path.
    pub async fn fetch_and_extract(
        &self,
        bucket: &str,
        cancel: &CancellationToken,
    ) -> ArtifactResult {
        let url = download_url(&self.settings.download_url_template, bucket);
        info!(%url, "fetching helper bundle");

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return cancelled(),
            response = self.client.get(&url).send() => response,
        };

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                warn!(%url, error = %e, "bundle request failed");
                remove_file_if_exists(&self.layout.download_zip()).await;
                return ArtifactResult::failed(FailureReason::Transport, RESPONSE_INVALID);
            }
        };

        let status = response.status();
        if status.as_u16() >= 400 {
            warn!(%url, %status, "bundle request rejected");
            remove_file_if_exists(&self.layout.download_zip()).await;
            return ArtifactResult::failed(
                FailureReason::HttpStatus,
                format!("Request returned {}", status.as_u16()),
            );
        }

        let body = tokio::select! {
            biased;
            _ = cancel.cancelled() => return cancelled(),
            body = response.bytes() => body,
        };

        let body = match body {
            Ok(body) => body,
            Err(e) => {
                warn!(%url, error = %e, "failed to read bundle body");
                remove_file_if_exists(&self.layout.download_zip()).await;
                return ArtifactResult::failed(FailureReason::Transport, RESPONSE_INVALID);
            }
        };
        debug!(bytes = body.len(), "bundle downloaded");

        if let Some(failure) = self.persist(&body).await {
            return failure;
        }

        if cancel.is_cancelled() {
            return cancelled();
        }

        if let Some(failure) = self.extract(cancel).await {
            return failure;
        }

        let entry_point = self.layout.entry_point(&self.settings);
        if !tokio::fs::try_exists(&entry_point).await.unwrap_or(false) {
            warn!(?entry_point, "entry point missing from bundle");
            remove_dir_if_exists(&self.layout.extract_dir()).await;
            return ArtifactResult::failed(FailureReason::Validation, ENTRY_POINT_MISSING);
        }

        let entry_point = absolute_path(&entry_point);
        info!(?entry_point, "helper bundle ready");
        ArtifactResult::succeeded(entry_point)
    }

    async fn persist(&self, body: &[u8]) -> Option<ArtifactResult> {
        let zip_path = self.layout.download_zip();
        remove_file_if_exists(&zip_path).await;

        let written = match tokio::fs::create_dir_all(self.layout.saved_dir()).await {
            Ok(()) => tokio::fs::write(&zip_path, body).await,
            Err(e) => Err(e),
        };

        let present = tokio::fs::try_exists(&zip_path).await.unwrap_or(false);
        match written {
            Ok(()) if present => None,
            result => {
                if let Err(e) = result {
                    warn!(?zip_path, error = %e, "failed to save bundle");
                }
                remove_file_if_exists(&zip_path).await;
                Some(ArtifactResult::failed(
                    FailureReason::Persistence,
                    SAVE_FAILED,
                ))
            }
        }
    }

    async fn extract(&self, cancel: &CancellationToken) -> Option<ArtifactResult> {
        let zip_path = self.layout.download_zip();
        let extract_dir = self.layout.extract_dir();
        remove_dir_if_exists(&extract_dir).await;

        let codec = Arc::clone(&self.codec);
        let token = cancel.clone();
        let dest = extract_dir.clone();
        let extracted =
            tokio::task::spawn_blocking(move || codec.extract_all(&zip_path, &dest, &token)).await;

        let failure = match extracted {
            Ok(Ok(())) => return None,
            Ok(Err(ArchiveError::Cancelled)) => cancelled(),
            Ok(Err(e)) => {
                warn!(error = %e, "bundle extraction failed");
                ArtifactResult::failed(FailureReason::Archive, EXTRACTION_FAILED)
            }
            Err(e) => {
                warn!(error = %e, "bundle extraction task failed");
                ArtifactResult::failed(FailureReason::Archive, EXTRACTION_FAILED)
            }
        };

        remove_dir_if_exists(&extract_dir).await;
        Some(failure)
    }
}
