//! Process session events and metadata.

use crate::operation_models::ResumeKind;
use crate::result_models::OperationOutcome;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Exit code reported when the real one could not be retrieved.
pub const EXIT_CODE_UNAVAILABLE: i32 = -1;

/// Something a running process session has to tell its caller.
///
/// Data events carry only the latest chunk read from the process. A chunk
/// that arrives before the caller observed the previous one replaces it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum ProcessEvent {
    /// New output was read from the process.
    DataAvailable { message: String },

    /// The process exited.
    Exited { code: i32 },
}

impl ProcessEvent {
    /// The process view of a resumption.
    ///
    /// `None` for cancellations and for outcomes that do not come from a
    /// process.
    pub fn from_resume(kind: &ResumeKind) -> Option<Self> {
        match kind {
            ResumeKind::DataAvailable(message) => Some(Self::DataAvailable {
                message: message.clone(),
            }),
            ResumeKind::Finished(OperationOutcome::ProcessExited { code }) => {
                Some(Self::Exited { code: *code })
            }
            ResumeKind::Finished(OperationOutcome::Artifact(_)) | ResumeKind::Cancelled => None,
        }
    }
}

/// Static description of a launched session.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct SessionInfo {
    /// OS process id, if the platform reported one.
    pub pid: Option<u32>,

    /// Program and quoted arguments, as displayed to the user.
    pub command_line: String,

    /// When the process was spawned.
    #[ts(type = "string")]
    pub started_at: DateTime<Utc>,
}
