//! Device registry error types

use thiserror::Error;

use crate::store::StoreError;

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Registry errors
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("device {0} must not be empty")]
    EmptyField(&'static str),

    #[error("device port must be between 1 and 65535")]
    InvalidPort,

    #[error("a device named '{0}' already exists")]
    DuplicateName(String),

    #[error("no device named '{0}' is registered")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
