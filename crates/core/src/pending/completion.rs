//! Completion state shared by one background task and the registry.
//!
//! Both sides hold a clone of the same `CompletionHandle`; the state is freed
//! when the last clone is dropped, so a lagging background write can never
//! touch released memory even if the registry entry is already gone.

use parking_lot::Mutex;
use psgcp_protocol::operation_models::OperationStatus;
use psgcp_protocol::result_models::OperationOutcome;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

const RUNNING: u8 = 0;
const DONE: u8 = 1;
const CANCELLED: u8 = 2;

#[derive(Debug)]
struct CompletionState {
    status: AtomicU8,
    data_ready: AtomicBool,
    latest_message: Mutex<Option<String>>,
    outcome: Mutex<Option<OperationOutcome>>,
    notify: Notify,
    cancel: CancellationToken,
}

/// Handle to the completion state of one pending operation.
///
/// Cloning is cheap; all clones observe the same state.
#[derive(Debug, Clone)]
pub struct CompletionHandle {
    inner: Arc<CompletionState>,
}

impl Default for CompletionHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl CompletionHandle {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(CompletionState {
                status: AtomicU8::new(RUNNING),
                data_ready: AtomicBool::new(false),
                latest_message: Mutex::new(None),
                outcome: Mutex::new(None),
                notify: Notify::new(),
                cancel: CancellationToken::new(),
            }),
        }
    }

    pub fn status(&self) -> OperationStatus {
        match self.inner.status.load(Ordering::Acquire) {
            RUNNING => OperationStatus::Running,
            DONE => OperationStatus::Done,
            _ => OperationStatus::Cancelled,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    /// Token background tasks observe at every loop iteration.
    pub fn cancellation(&self) -> CancellationToken {
        self.inner.cancel.clone()
    }

    /// Replace the latest message and raise the data-ready flag.
    ///
    /// Last write wins: a message the main context has not observed yet is
    /// overwritten. Ignored once the operation is terminal.
    pub fn publish_data(&self, message: String) -> bool {
        if self.status().is_terminal() {
            return false;
        }
        *self.inner.latest_message.lock() = Some(message);
        self.inner.data_ready.store(true, Ordering::Release);
        true
    }

    /// Clear the data-ready flag, returning the latest message if it was set.
    pub fn take_data(&self) -> Option<String> {
        if self.inner.data_ready.swap(false, Ordering::AcqRel) {
            self.inner.latest_message.lock().clone()
        } else {
            None
        }
    }

    /// Most recent message, whether or not it has been observed.
    pub fn latest_message(&self) -> Option<String> {
        self.inner.latest_message.lock().clone()
    }

    /// Move to `Done` with `outcome`. Only the first terminal transition wins.
    pub fn finish(&self, outcome: OperationOutcome) -> bool {
        let mut slot = self.inner.outcome.lock();
        if self
            .inner
            .status
            .compare_exchange(RUNNING, DONE, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        *slot = Some(outcome);
        drop(slot);
        self.inner.notify.notify_waiters();
        true
    }

    /// Move to `Cancelled` and trip the cancellation token.
    pub fn cancel(&self) -> bool {
        if self
            .inner
            .status
            .compare_exchange(RUNNING, CANCELLED, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        self.inner.cancel.cancel();
        self.inner.notify.notify_waiters();
        true
    }

    /// The terminal outcome, once `Done`.
    pub fn outcome(&self) -> Option<OperationOutcome> {
        self.inner.outcome.lock().clone()
    }

    /// Wait until the operation is `Done` or `Cancelled`.
    pub async fn finished(&self) -> OperationStatus {
        loop {
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let status = self.status();
            if status.is_terminal() {
                return status;
            }
            notified.await;
        }
    }

    /// Whether `other` refers to the same underlying state.
    pub fn same_as(&self, other: &CompletionHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
