//! Document store error types

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for document store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Document store errors.
///
/// Malformed document content is not an error: stores self-heal by resetting
/// to the default document. Only real I/O and encoding failures surface.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read document {path}: {source}")]
    ReadFailed { path: PathBuf, source: io::Error },

    #[error("failed to write document {path}: {source}")]
    WriteFailed { path: PathBuf, source: io::Error },

    #[error("failed to encode document {path}: {source}")]
    EncodeFailed {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl StoreError {
    pub fn read_failed(path: &std::path::Path, source: io::Error) -> Self {
        Self::ReadFailed {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn write_failed(path: &std::path::Path, source: io::Error) -> Self {
        Self::WriteFailed {
            path: path.to_path_buf(),
            source,
        }
    }
}
