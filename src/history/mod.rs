//! Run history store
//!
//! Append-only log of backup cycle outcomes: newest-first, capped at the
//! most recent 1000 records, persisted with the same atomic-rename and
//! single-writer-queue discipline as the device registry.

mod errors;
mod stats;

pub use errors::{HistoryError, HistoryResult};
pub use stats::{device_stats, overall_stats, DeviceStats, OverallStats};

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::DocumentStore;

/// Maximum number of retained run records; the oldest are evicted.
pub const MAX_RUN_RECORDS: usize = 1000;

/// Outcome of one device within one cycle.
///
/// `success` reflects the backup itself. Delivery failures are carried
/// separately: a device whose backup succeeded but whose export could not be
/// sent is still a successful backup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceOutcome {
    pub name: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub delivery_errors: Vec<String>,
}

impl DeviceOutcome {
    /// A successful backup with its local artifact pair.
    pub fn succeeded(name: &str, backup_path: PathBuf, export_path: PathBuf) -> Self {
        Self {
            name: name.to_string(),
            success: true,
            error: None,
            backup_path: Some(backup_path),
            export_path: Some(export_path),
            delivery_errors: Vec::new(),
        }
    }

    /// A failed backup carrying its sanitized error text.
    pub fn failed(name: &str, error: String) -> Self {
        Self {
            name: name.to_string(),
            success: false,
            error: Some(error),
            backup_path: None,
            export_path: None,
            delivery_errors: Vec::new(),
        }
    }
}

/// One backup cycle's outcome record. Never mutated after append.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub timestamp: DateTime<Utc>,
    pub triggered_by_schedule: bool,
    pub routers: Vec<DeviceOutcome>,
}

impl RunRecord {
    pub fn new(triggered_by_schedule: bool, routers: Vec<DeviceOutcome>) -> Self {
        Self {
            timestamp: Utc::now(),
            triggered_by_schedule,
            routers,
        }
    }
}

/// The run history document.
pub struct HistoryStore {
    store: DocumentStore<Vec<RunRecord>>,
}

impl HistoryStore {
    /// Opens the history backed by `<data_dir>/history.json`.
    pub fn open(data_dir: &Path) -> Self {
        Self {
            store: DocumentStore::open(data_dir.join("history.json")),
        }
    }

    /// Prepends a record and truncates to the retention cap.
    ///
    /// Validation runs before the queued write: a record with no device
    /// outcomes is rejected without touching the document.
    pub async fn append(&self, record: RunRecord) -> HistoryResult<()> {
        if record.routers.is_empty() {
            return Err(HistoryError::EmptyOutcomes);
        }
        self.store
            .update(move |records| {
                records.insert(0, record);
                records.truncate(MAX_RUN_RECORDS);
                Ok(())
            })
            .await
    }

    /// Lists records newest-first. Self-healing on a malformed document.
    pub fn list(&self) -> HistoryResult<Vec<RunRecord>> {
        Ok(self.store.load()?)
    }

    /// Statistics for one device.
    pub fn stats_for_device(&self, name: &str) -> HistoryResult<DeviceStats> {
        Ok(device_stats(&self.store.load()?, name))
    }

    /// Aggregate statistics across all retained records.
    pub fn stats_overall(&self) -> HistoryResult<OverallStats> {
        Ok(overall_stats(&self.store.load()?))
    }
}
