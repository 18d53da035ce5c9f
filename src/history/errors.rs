//! Run history error types

use thiserror::Error;

use crate::store::StoreError;

/// Result type for history operations
pub type HistoryResult<T> = Result<T, HistoryError>;

/// Run history errors
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("run record must contain at least one device outcome")]
    EmptyOutcomes,

    #[error(transparent)]
    Store(#[from] StoreError),
}
