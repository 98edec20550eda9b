//! Pending-operation identity and resumption descriptors.
//!
//! A pending operation is keyed by the caller that started it and the call
//! site within that caller, so repeated polls from the same call site
//! converge on a single in-flight operation.

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;
use uuid::Uuid;

use crate::result_models::OperationOutcome;

/// Identity of the object that started an operation.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, TS)]
pub struct CallerId(pub Uuid);

impl CallerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CallerId {
    fn default() -> Self {
        Self::new()
    }
}

/// Token distinguishing call sites within one caller.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, TS)]
pub struct CallSiteId(pub u32);

/// Registry key of a pending operation.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, TS)]
pub struct OperationKey {
    pub caller: CallerId,
    pub call_site: CallSiteId,
}

impl OperationKey {
    pub fn new(caller: CallerId, call_site: CallSiteId) -> Self {
        Self { caller, call_site }
    }
}

impl fmt::Display for OperationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.caller.0, self.call_site.0)
    }
}

/// Where execution resumes when an operation reports progress or completes.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct Continuation {
    /// Name of the function to resume.
    pub function: String,

    /// Output link within that function.
    pub link: i32,

    /// Caller the function is resumed on.
    pub caller: CallerId,
}

impl Continuation {
    pub fn new(function: impl Into<String>, link: i32, caller: CallerId) -> Self {
        Self {
            function: function.into(),
            link,
            caller,
        }
    }
}

/// Lifecycle status of a pending operation.
///
/// Progresses `Running -> Done` or `Running -> Cancelled`; both terminal
/// states are final.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationStatus {
    Running,
    Done,
    Cancelled,
}

impl OperationStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Running)
    }
}

/// Why a continuation is being resumed.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum ResumeKind {
    /// Still running; the latest output chunk arrived.
    DataAvailable(String),

    /// Finished. The entry has been removed from the registry.
    Finished(OperationOutcome),

    /// Cancelled. The entry has been removed from the registry.
    Cancelled,
}
