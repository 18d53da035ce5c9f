//! Orchestrator error types

use thiserror::Error;

use crate::history::HistoryError;
use crate::registry::RegistryError;

/// Result type for orchestrator operations
pub type OrchestratorResult<T> = Result<T, OrchestratorError>;

/// Cycle-level failures.
///
/// Per-device backup and delivery failures are not errors here; they are
/// folded into the cycle's outcome list. Only the stores can fail a cycle.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    History(#[from] HistoryError),
}
