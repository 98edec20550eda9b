//! Error types for archive operations.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid archive {path}: {source}")]
    Zip {
        path: PathBuf,
        source: ::zip::result::ZipError,
    },

    #[error("Failed to traverse directory {path}: {source}")]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },

    #[error("Entry path {0} cannot be stored in an archive")]
    UnsafePath(PathBuf),

    #[error("Archive operation was cancelled")]
    Cancelled,
}

impl ArchiveError {
    pub(crate) fn io(path: &std::path::Path) -> impl FnOnce(std::io::Error) -> Self + '_ {
        move |source| Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn zip(path: &std::path::Path) -> impl FnOnce(::zip::result::ZipError) -> Self + '_ {
        move |source| Self::Zip {
            path: path.to_path_buf(),
            source,
        }
    }
}
