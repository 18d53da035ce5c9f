//! CLI error types
//!
//! Every subsystem error funnels here so `main` can print one line and exit
//! non-zero.

use thiserror::Error;

use crate::artifact::ArtifactError;
use crate::config::ConfigError;
use crate::history::HistoryError;
use crate::orchestrator::OrchestratorError;
use crate::registry::RegistryError;
use crate::schedule::ScheduleError;
use crate::session::SessionError;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// CLI errors
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    History(#[from] HistoryError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),

    #[error("async runtime could not be started: {0}")]
    Runtime(std::io::Error),
}
