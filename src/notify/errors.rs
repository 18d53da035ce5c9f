//! Messaging delivery error types

use thiserror::Error;

/// Result type for delivery operations
pub type NotifyResult<T> = Result<T, NotifyError>;

/// Delivery errors. Never fatal to a backup outcome.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("message delivery failed: {0}")]
    Delivery(String),

    #[error("file {path} could not be read for delivery: {detail}")]
    FileUnreadable { path: String, detail: String },
}
