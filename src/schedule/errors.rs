//! Schedule error types

use thiserror::Error;

use crate::store::StoreError;

/// Result type for schedule operations
pub type ScheduleResult<T> = Result<T, ScheduleError>;

/// Schedule errors
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("invalid cron expression '{expression}': {detail}")]
    InvalidExpression { expression: String, detail: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}
