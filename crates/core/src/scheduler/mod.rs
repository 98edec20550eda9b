//! The main scheduling context.
//!
//! `Scheduler` starts background work (processes, bundle fetches, packaging)
//! on tokio tasks and reports their progress back through [`Scheduler::tick`].
//! Background tasks never touch the registry directly; they only write to the
//! shared `CompletionHandle` of their operation.

use crate::archive::{ArchiveCodec, ZipCodec};
use crate::config::models::{CoreSettings, StorageLayout};
use crate::pending::{CompletionHandle, PendingRegistry, Resumption};
use crate::pipelines::{FetchPipeline, PackagePipeline};
use crate::process::{CommandLine, ProcessError, ProcessSession, SessionOptions};
use psgcp_protocol::operation_models::{Continuation, OperationKey};
use psgcp_protocol::result_models::OperationOutcome;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Owns the pending-operation registry and the shared resources the
/// background work needs.
pub struct Scheduler {
    registry: PendingRegistry,
    layout: StorageLayout,
    settings: CoreSettings,
    fetch: Arc<FetchPipeline>,
    package: Arc<PackagePipeline>,
}

impl Scheduler {
    /// Create a scheduler using the zip codec.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(layout: StorageLayout, settings: CoreSettings) -> Result<Self, reqwest::Error> {
        Self::with_codec(layout, settings, Arc::new(ZipCodec))
    }

    /// Create a scheduler with a custom archive codec.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_codec(
        layout: StorageLayout,
        settings: CoreSettings,
        codec: Arc<dyn ArchiveCodec>,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(settings.http_timeout())
            .build()?;

        let fetch = Arc::new(FetchPipeline::new(
            client,
            layout.clone(),
            settings.clone(),
            Arc::clone(&codec),
        ));
        let package = Arc::new(PackagePipeline::new(layout.clone(), codec));

        Ok(Self {
            registry: PendingRegistry::new(),
            layout,
            settings,
            fetch,
            package,
        })
    }

    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    pub fn settings(&self) -> &CoreSettings {
        &self.settings
    }

    /// Launch `command` as the operation for `key`.
    ///
    /// Output chunks resume `continuation` with `DataAvailable`; the exit
    /// resumes it once with `ProcessExited`.
    ///
    /// # Errors
    ///
    /// Returns `ProcessError::AlreadyPending` if a process for `key` is still
    /// live, or the launch error if the process could not be started. A
    /// failed launch leaves nothing registered.
    pub fn launch_process(
        &mut self,
        key: OperationKey,
        continuation: Continuation,
        command: CommandLine,
    ) -> Result<ProcessSession, ProcessError> {
        let resolved = self.registry.resolve(key, continuation);
        if !resolved.fresh {
            return Err(ProcessError::AlreadyPending(key.to_string()));
        }

        let options = SessionOptions {
            exit_status_delay: self.settings.exit_status_delay(),
            working_dir: None,
        };

        match ProcessSession::launch(command, resolved.completion, options) {
            Ok(session) => Ok(session),
            Err(e) => {
                self.registry.discard(&key);
                Err(e)
            }
        }
    }

    /// Download and extract the helper bundle of `bucket`.
    ///
    /// Resolving a key that is already pending re-targets its continuation
    /// and returns the existing handle without starting another download.
    pub fn fetch_bundle(
        &mut self,
        key: OperationKey,
        continuation: Continuation,
        bucket: impl Into<String>,
    ) -> CompletionHandle {
        let resolved = self.registry.resolve(key, continuation);
        if resolved.fresh {
            let pipeline = Arc::clone(&self.fetch);
            let completion = resolved.completion.clone();
            let bucket = bucket.into();
            tokio::spawn(async move {
                let cancel = completion.cancellation();
                let result = pipeline.fetch_and_extract(&bucket, &cancel).await;
                debug!(%key, success = result.is_success(), "bundle fetch finished");
                completion.finish(OperationOutcome::Artifact(result));
            });
        }
        resolved.completion
    }

    /// Compress `source` into the package archive.
    ///
    /// Same key semantics as [`Scheduler::fetch_bundle`].
    pub fn package_directory(
        &mut self,
        key: OperationKey,
        continuation: Continuation,
        source: impl Into<PathBuf>,
    ) -> CompletionHandle {
        let resolved = self.registry.resolve(key, continuation);
        if resolved.fresh {
            let pipeline = Arc::clone(&self.package);
            let completion = resolved.completion.clone();
            let source = source.into();
            tokio::spawn(async move {
                let cancel = completion.cancellation();
                let result = pipeline.package_directory(&source, &cancel).await;
                debug!(%key, success = result.is_success(), "packaging finished");
                completion.finish(OperationOutcome::Artifact(result));
            });
        }
        resolved.completion
    }

    /// Cancel the operation for `key`. Its continuation resumes as cancelled
    /// on the next tick.
    pub fn cancel(&mut self, key: &OperationKey) -> bool {
        let cancelled = self.registry.cancel(key);
        if cancelled {
            info!(%key, "operation cancelled");
        }
        cancelled
    }

    /// Inspect every pending operation once.
    pub fn tick(&mut self) -> Vec<Resumption> {
        self.registry.tick()
    }

    pub fn pending_count(&self) -> usize {
        self.registry.len()
    }

    pub fn is_pending(&self, key: &OperationKey) -> bool {
        self.registry.contains(key)
    }
}
