//! Persisted Google Cloud project information.
//!
//! The host saves the last project the user configured so the form can be
//! pre-filled next time. On disk the record looks like:
//!
//! ```json
//! {
//!   "gc_project_info": {
//!     "projectId": "my-project",
//!     "bucketName": "my-bucket",
//!     "plainCredentials": "{...}",
//!     "uniqueAppName": "my-app",
//!     "vmZone": "europe-west1-b",
//!     "gpuName": "nvidia-tesla-t4"
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Google Cloud deployment settings entered by the user.
///
/// Every field is required when loading; an empty string is a valid value.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq, TS)]
#[serde(rename_all = "camelCase")]
pub struct ProjectInfo {
    /// Google Cloud project identifier.
    pub project_id: String,

    /// Bucket that hosts the helper bundle and receives uploads.
    pub bucket_name: String,

    /// Service account credentials, stored verbatim.
    pub plain_credentials: String,

    /// Application name, unique within the project.
    pub unique_app_name: String,

    /// Compute Engine zone for the streaming VM.
    pub vm_zone: String,

    /// GPU accelerator type for the streaming VM.
    pub gpu_name: String,
}

/// On-disk envelope around [`ProjectInfo`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct SavedProjectFile {
    pub gc_project_info: ProjectInfo,
}

impl From<ProjectInfo> for SavedProjectFile {
    fn from(gc_project_info: ProjectInfo) -> Self {
        Self { gc_project_info }
    }
}
