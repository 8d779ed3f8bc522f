use std::fmt::Display;
use std::path::PathBuf;
use thiserror::Error;

use super::SnapshotFormat;

/// Errors raised while reading or writing a graph snapshot.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("cannot access snapshot at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("snapshot {path} is not valid {format}: {message}")]
    Corrupt {
        path: PathBuf,
        format: SnapshotFormat,
        message: String,
    },

    #[error("cannot encode snapshot as {format}: {message}")]
    Encode {
        format: SnapshotFormat,
        message: String,
    },

    #[error("snapshot path has no file name: {0}")]
    InvalidPath(PathBuf),
}

impl StorageError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn corrupt(path: impl Into<PathBuf>, format: SnapshotFormat, err: impl Display) -> Self {
        StorageError::Corrupt {
            path: path.into(),
            format,
            message: err.to_string(),
        }
    }

    pub(crate) fn encode(format: SnapshotFormat, err: impl Display) -> Self {
        StorageError::Encode {
            format,
            message: err.to_string(),
        }
    }
}
