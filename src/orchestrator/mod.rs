//! Backup orchestrator
//!
//! Drives one backup cycle over a device set: notify start, process devices
//! strictly sequentially in registry order, deliver artifacts, persist one
//! run record, update failure counters, escalate, notify summary.
//!
//! The orchestrator does not serialize cycles against each other; the
//! registry and history stores serialize their own writes, and the context
//! behind a mutex keeps counter updates coherent when cycles overlap.

mod context;
mod errors;

pub use context::{LastRunMeta, OrchestratorContext};
pub use errors::{OrchestratorError, OrchestratorResult};

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::history::{DeviceOutcome, HistoryStore, RunRecord};
use crate::notify::Messenger;
use crate::registry::{names_match, Device, DeviceRegistry};
use crate::sanitize::redact_credentials;
use crate::session::BackupExecutor;

/// Consecutive failures after which the escalation alert fires.
pub const DEFAULT_ALERT_THRESHOLD: u32 = 3;

/// Which devices one cycle covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleTarget {
    All,
    Device(String),
}

/// Aggregated result of a completed cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleSummary {
    pub success: usize,
    pub failed: usize,
    pub outcomes: Vec<DeviceOutcome>,
}

/// What a cycle invocation produced.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleReport {
    /// Registry was empty; no record written.
    NoDevices,
    /// The requested device is not registered; no record written.
    UnknownDevice(String),
    Completed(CycleSummary),
}

/// One-cycle-at-a-time backup driver over injected collaborators.
pub struct Orchestrator {
    registry: Arc<DeviceRegistry>,
    history: Arc<HistoryStore>,
    executor: Arc<dyn BackupExecutor>,
    messenger: Arc<dyn Messenger>,
    context: Mutex<OrchestratorContext>,
    chat_id: i64,
    alert_threshold: u32,
}

impl Orchestrator {
    pub fn new(
        registry: Arc<DeviceRegistry>,
        history: Arc<HistoryStore>,
        executor: Arc<dyn BackupExecutor>,
        messenger: Arc<dyn Messenger>,
        chat_id: i64,
        alert_threshold: u32,
    ) -> Self {
        Self {
            registry,
            history,
            executor,
            messenger,
            context: Mutex::new(OrchestratorContext::default()),
            chat_id,
            alert_threshold,
        }
    }

    /// Runs one backup cycle and appends its run record.
    pub async fn run_cycle(
        &self,
        target: CycleTarget,
        triggered_by_schedule: bool,
    ) -> OrchestratorResult<CycleReport> {
        let devices = self.registry.list()?;
        if devices.is_empty() {
            self.notify("No devices are registered. Add one before running a backup.")
                .await;
            return Ok(CycleReport::NoDevices);
        }

        let targets: Vec<Device> = match &target {
            CycleTarget::All => devices,
            CycleTarget::Device(name) => {
                match devices.into_iter().find(|d| names_match(&d.name, name)) {
                    Some(device) => vec![device],
                    None => {
                        self.notify(&format!("Device '{}' is not registered.", name.trim()))
                            .await;
                        return Ok(CycleReport::UnknownDevice(name.trim().to_string()));
                    }
                }
            }
        };

        info!(devices = targets.len(), triggered_by_schedule, "backup cycle starting");
        self.notify(&format!("Starting backup of {} device(s).", targets.len()))
            .await;

        let mut outcomes = Vec::with_capacity(targets.len());
        for device in &targets {
            outcomes.push(self.backup_device(device).await);
        }

        let success = outcomes.iter().filter(|o| o.success).count();
        let failed = outcomes.len() - success;

        let record = RunRecord::new(triggered_by_schedule, outcomes.clone());
        let timestamp = record.timestamp;
        self.history.append(record).await?;

        {
            let mut ctx = self.context.lock().await;
            ctx.set_last_run(LastRunMeta {
                timestamp,
                triggered_by_schedule,
                success,
                failed,
            });
            self.escalate(&mut ctx, &outcomes).await;
        }

        self.notify(&format!(
            "Backup finished: {success} succeeded, {failed} failed."
        ))
        .await;
        info!(success, failed, "backup cycle finished");

        Ok(CycleReport::Completed(CycleSummary {
            success,
            failed,
            outcomes,
        }))
    }

    /// Most recently completed cycle, for status queries.
    pub async fn last_run(&self) -> Option<LastRunMeta> {
        self.context.lock().await.last_run().cloned()
    }

    /// One device's attempt plus artifact delivery.
    ///
    /// Delivery failures land in `delivery_errors` and never flip `success`:
    /// the backup itself already completed.
    async fn backup_device(&self, device: &Device) -> DeviceOutcome {
        info!(device = %device.name, "backing up device");

        match self.executor.perform_backup(device).await {
            Ok(pair) => {
                let mut outcome =
                    DeviceOutcome::succeeded(&device.name, pair.backup_path, pair.export_path);
                self.deliver(&mut outcome).await;
                outcome
            }
            Err(e) => {
                if e.is_network_flaky() {
                    debug!(device = %device.name, error = %e, "device backup failed");
                } else {
                    warn!(device = %device.name, error = %e, "device backup failed");
                }
                DeviceOutcome::failed(&device.name, redact_credentials(&e.to_string()))
            }
        }
    }

    async fn deliver(&self, outcome: &mut DeviceOutcome) {
        let artifacts = [
            (
                outcome.backup_path.clone(),
                format!("{} binary backup", outcome.name),
            ),
            (
                outcome.export_path.clone(),
                format!("{} configuration export", outcome.name),
            ),
        ];

        for (path, caption) in artifacts {
            let Some(path) = path else { continue };
            if let Err(e) = self.messenger.send_file(self.chat_id, &path, &caption).await {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "artifact delivery failed"
                );
                outcome
                    .delivery_errors
                    .push(redact_credentials(&format!("{caption}: {e}")));
            }
        }
    }

    /// Updates per-device failure counters and alerts at the threshold.
    ///
    /// The counter is uncapped: once a device reaches the threshold, every
    /// further failure re-alerts until a success resets it.
    async fn escalate(&self, ctx: &mut OrchestratorContext, outcomes: &[DeviceOutcome]) {
        for outcome in outcomes {
            let count = ctx.apply_outcome(&outcome.name, outcome.success);
            if !outcome.success && count >= self.alert_threshold {
                let error = outcome.error.as_deref().unwrap_or("unknown error");
                self.notify(&format!(
                    "Device '{}' has failed {count} consecutive backups. Last error: {error}",
                    outcome.name
                ))
                .await;
            }
        }
    }

    /// Best-effort text notice; delivery failures are logged, never raised.
    async fn notify(&self, text: &str) {
        if let Err(e) = self.messenger.send_text(self.chat_id, text).await {
            warn!(error = %e, "notification delivery failed");
        }
    }
}
