//! Remote session client
//!
//! Performs exactly one backup attempt or one connectivity probe against one
//! device over SSH, with SFTP as the file-transfer sub-channel on the same
//! session. The `BackupExecutor` trait is the seam the orchestrator depends
//! on, so cycles are testable without a reachable device.

mod client;
pub mod commands;
mod errors;

pub use client::SshBackupClient;
pub use errors::{ConnectErrorKind, SessionError, SessionResult};

use std::path::PathBuf;

use async_trait::async_trait;

use crate::registry::Device;

/// Local paths of the two files produced by one successful backup attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPair {
    pub backup_path: PathBuf,
    pub export_path: PathBuf,
}

/// One backup attempt or connectivity probe per call; implementations own
/// the full session lifetime and never share connections between calls.
#[async_trait]
pub trait BackupExecutor: Send + Sync {
    /// Produces the device's artifact pair locally.
    async fn perform_backup(&self, device: &Device) -> SessionResult<ArtifactPair>;

    /// Opens a session, runs a read-only status command, closes the session.
    async fn test_connection(&self, device: &Device) -> SessionResult<()>;
}
