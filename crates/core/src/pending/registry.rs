//! Registry of pending operations keyed by caller and call site.
//!
//! The registry is owned by the main scheduling context. Every tick it
//! inspects each entry and reports which continuations should resume:
//! - `Done` entries resume once with their outcome and are removed
//! - `Cancelled` entries resume once as cancelled and are removed
//! - running entries with fresh data resume without being removed

use crate::pending::completion::CompletionHandle;
use chrono::{DateTime, Utc};
use psgcp_protocol::operation_models::{Continuation, OperationKey, OperationStatus, ResumeKind};
use std::collections::HashMap;
use tracing::{debug, warn};
use uuid::Uuid;

/// One in-flight operation tracked by the registry.
#[derive(Debug)]
pub struct PendingOperation {
    id: Uuid,
    key: OperationKey,
    continuation: Continuation,
    completion: CompletionHandle,
    registered_at: DateTime<Utc>,
}

impl PendingOperation {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn key(&self) -> OperationKey {
        self.key
    }

    pub fn continuation(&self) -> &Continuation {
        &self.continuation
    }

    pub fn completion(&self) -> &CompletionHandle {
        &self.completion
    }

    pub fn registered_at(&self) -> DateTime<Utc> {
        self.registered_at
    }
}

/// Result of [`PendingRegistry::resolve`].
#[derive(Debug, Clone)]
pub struct Resolved {
    /// Stable id of the registry entry.
    pub operation_id: Uuid,

    /// Handle the background work reports through.
    pub completion: CompletionHandle,

    /// `true` when the entry was just created and work must be started.
    /// `false` when an existing entry was re-initialized.
    pub fresh: bool,
}

/// A continuation the main context should resume now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resumption {
    pub key: OperationKey,
    pub operation_id: Uuid,
    pub continuation: Continuation,
    pub kind: ResumeKind,
}

/// Pending operations, at most one per key.
#[derive(Debug, Default)]
pub struct PendingRegistry {
    operations: HashMap<OperationKey, PendingOperation>,
}

impl PendingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Find the operation for `key`, or register a new one.
    ///
    /// An existing entry is re-initialized with `continuation` and keeps its
    /// completion handle, so repeated polls from one call site converge on a
    /// single operation instead of starting duplicates.
    pub fn resolve(&mut self, key: OperationKey, continuation: Continuation) -> Resolved {
        if let Some(existing) = self.operations.get_mut(&key) {
            debug!(%key, operation_id = %existing.id, "re-initializing pending operation");
            existing.continuation = continuation;
            return Resolved {
                operation_id: existing.id,
                completion: existing.completion.clone(),
                fresh: false,
            };
        }

        let operation = PendingOperation {
            id: Uuid::new_v4(),
            key,
            continuation,
            completion: CompletionHandle::new(),
            registered_at: Utc::now(),
        };
        debug!(%key, operation_id = %operation.id, "registered pending operation");

        let resolved = Resolved {
            operation_id: operation.id,
            completion: operation.completion.clone(),
            fresh: true,
        };
        self.operations.insert(key, operation);
        resolved
    }

    /// Inspect every entry once and collect the continuations to resume.
    pub fn tick(&mut self) -> Vec<Resumption> {
        let mut resumed = Vec::new();

        self.operations.retain(|key, operation| {
            let resume = |kind| Resumption {
                key: *key,
                operation_id: operation.id,
                continuation: operation.continuation.clone(),
                kind,
            };

            match operation.completion.status() {
                OperationStatus::Done => {
                    match operation.completion.outcome() {
                        Some(outcome) => resumed.push(resume(ResumeKind::Finished(outcome))),
                        None => warn!(%key, "operation done without an outcome"),
                    }
                    false
                }
                OperationStatus::Cancelled => {
                    resumed.push(resume(ResumeKind::Cancelled));
                    false
                }
                OperationStatus::Running => {
                    if let Some(message) = operation.completion.take_data() {
                        resumed.push(resume(ResumeKind::DataAvailable(message)));
                    }
                    true
                }
            }
        });

        resumed
    }

    /// Cancel the operation for `key`. It is removed on the next tick.
    pub fn cancel(&mut self, key: &OperationKey) -> bool {
        match self.operations.get(key) {
            Some(operation) => operation.completion.cancel(),
            None => false,
        }
    }

    /// Remove the entry for `key` without resuming its continuation.
    ///
    /// Used when the work behind a freshly registered entry could not start.
    pub fn discard(&mut self, key: &OperationKey) -> Option<PendingOperation> {
        let operation = self.operations.remove(key)?;
        operation.completion.cancel();
        Some(operation)
    }

    pub fn get(&self, key: &OperationKey) -> Option<&PendingOperation> {
        self.operations.get(key)
    }

    pub fn contains(&self, key: &OperationKey) -> bool {
        self.operations.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

impl Drop for PendingRegistry {
    fn drop(&mut self) {
        for operation in self.operations.values() {
            operation.completion.cancel();
        }
    }
}
