//! Artifact locator error types

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for artifact operations
pub type ArtifactResult<T> = Result<T, ArtifactError>;

/// Artifact locator errors
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to scan {path}: {source}")]
    ScanFailed { path: PathBuf, source: io::Error },

    #[error("failed to delete {path}: {source}")]
    DeleteFailed { path: PathBuf, source: io::Error },
}
