//! Archive codec used by the fetch and packaging pipelines.
//!
//! The pipelines only depend on the [`ArchiveCodec`] trait; [`ZipCodec`] is
//! the implementation used in production.

pub mod error;
pub mod zip_codec;

pub use zip_codec::ZipCodec;
pub use error::ArchiveError;

use std::path::Path;
use tokio_util::sync::CancellationToken;

/// Compresses directory trees to, and extracts them from, a single archive.
///
/// Implementations are blocking and are run on the blocking thread pool.
/// They must check `cancel` between entries and return
/// `ArchiveError::Cancelled` once it is tripped.
pub trait ArchiveCodec: Send + Sync {
    /// Extract every entry of `archive` under `dest`, creating it if needed.
    fn extract_all(
        &self,
        archive: &Path,
        dest: &Path,
        cancel: &CancellationToken,
    ) -> Result<(), ArchiveError>;

    /// Compress the whole tree under `source` into `archive`.
    ///
    /// `archive` itself and every path in `exclude` (with everything below
    /// it) are left out when they lie inside `source`.
    fn compress_dir(
        &self,
        source: &Path,
        archive: &Path,
        exclude: &[&Path],
        cancel: &CancellationToken,
    ) -> Result<(), ArchiveError>;
}
