//! Results produced by the fetch and packaging pipelines.
//!
//! A pipeline run yields exactly one [`ArtifactResult`], which is consumed
//! once by the caller's continuation. Failures carry a [`FailureReason`] so
//! callers can branch on the kind of failure without matching on messages.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use ts_rs::TS;

/// Why a pipeline run failed.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureReason {
    /// The request could not be sent or the response body could not be read.
    Transport,

    /// The server answered with a status code of 400 or above.
    HttpStatus,

    /// A local file could not be written or was absent after writing.
    Persistence,

    /// Extraction or compression failed.
    Archive,

    /// The expected entry point was missing after extraction.
    Validation,

    /// The directory to package does not exist.
    MissingSource,

    /// The operation was cancelled before it finished.
    Cancelled,
}

/// Outcome of a pipeline run.
///
/// Uses tagged serialization:
/// ```json
/// { "status": "succeeded", "path": "/abs/path/to/artifact" }
/// { "status": "failed", "reason": "HTTP_STATUS", "message": "Request returned 404" }
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ArtifactResult {
    /// The artifact was produced at `path` (absolute).
    Succeeded { path: PathBuf },

    /// The run failed; `message` is meant for display.
    Failed {
        reason: FailureReason,
        message: String,
    },
}

impl ArtifactResult {
    pub fn succeeded(path: impl Into<PathBuf>) -> Self {
        Self::Succeeded { path: path.into() }
    }

    pub fn failed(reason: FailureReason, message: impl Into<String>) -> Self {
        Self::Failed {
            reason,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    /// The artifact path, present only on success.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Succeeded { path } => Some(path),
            Self::Failed { .. } => None,
        }
    }

    /// The error message, present only on failure.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Succeeded { .. } => None,
            Self::Failed { message, .. } => Some(message),
        }
    }

    pub fn reason(&self) -> Option<FailureReason> {
        match self {
            Self::Succeeded { .. } => None,
            Self::Failed { reason, .. } => Some(*reason),
        }
    }
}

/// Terminal value stored on a finished pending operation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum OperationOutcome {
    /// A fetch or packaging run finished.
    Artifact(ArtifactResult),

    /// A launched process exited. `code` is -1 when it could not be retrieved.
    ProcessExited { code: i32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_result_accessors() {
        let ok = ArtifactResult::succeeded("/tmp/out.zip");
        assert!(ok.is_success());
        assert_eq!(ok.path(), Some(Path::new("/tmp/out.zip")));
        assert_eq!(ok.message(), None);
        assert_eq!(ok.reason(), None);

        let failed = ArtifactResult::failed(FailureReason::HttpStatus, "Request returned 404");
        assert!(!failed.is_success());
        assert_eq!(failed.path(), None);
        assert_eq!(failed.message(), Some("Request returned 404"));
        assert_eq!(failed.reason(), Some(FailureReason::HttpStatus));
    }
}
