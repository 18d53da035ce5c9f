//! End-to-end cycle tests over scripted collaborators
//!
//! The executor and messenger are test doubles, so these exercise the full
//! orchestrator path: registry read, sequential device loop, delivery,
//! record persistence, failure counters and escalation.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use routervault::history::HistoryStore;
use routervault::notify::{Messenger, NotifyError, NotifyResult};
use routervault::orchestrator::{CycleReport, CycleTarget, Orchestrator};
use routervault::registry::{Device, DeviceRegistry};
use routervault::session::{
    ArtifactPair, BackupExecutor, ConnectErrorKind, SessionError, SessionResult,
};
use tempfile::TempDir;
use tokio::sync::Mutex;

const ALERT_THRESHOLD: u32 = 3;
const CHAT_ID: i64 = 4242;

fn device(name: &str) -> Device {
    Device {
        name: name.to_string(),
        host: "192.0.2.20".to_string(),
        username: "admin".to_string(),
        password: "secret".to_string(),
        port: 22,
    }
}

fn timeout_error() -> SessionError {
    SessionError::Connect {
        host: "192.0.2.20".to_string(),
        port: 22,
        kind: ConnectErrorKind::Timeout,
        detail: "connection timed out".to_string(),
    }
}

/// Executor scripted per device name: listed names fail, the rest succeed.
struct ScriptedExecutor {
    failing: Vec<String>,
}

impl ScriptedExecutor {
    fn all_ok() -> Self {
        Self {
            failing: Vec::new(),
        }
    }

    fn failing(names: &[&str]) -> Self {
        Self {
            failing: names.iter().map(|n| n.to_string()).collect(),
        }
    }
}

#[async_trait]
impl BackupExecutor for ScriptedExecutor {
    async fn perform_backup(&self, device: &Device) -> SessionResult<ArtifactPair> {
        if self.failing.iter().any(|n| n == &device.name) {
            return Err(timeout_error());
        }
        Ok(ArtifactPair {
            backup_path: PathBuf::from(format!("/backups/{}/backup/file.backup", device.name)),
            export_path: PathBuf::from(format!("/backups/{}/export/file.rsc", device.name)),
        })
    }

    async fn test_connection(&self, _device: &Device) -> SessionResult<()> {
        Ok(())
    }
}

/// Executor scripted per call: each backup pops the next "should fail" flag;
/// an exhausted script succeeds.
struct SequenceExecutor {
    outcomes: Mutex<std::collections::VecDeque<bool>>,
}

impl SequenceExecutor {
    fn new(failures: impl IntoIterator<Item = bool>) -> Self {
        Self {
            outcomes: Mutex::new(failures.into_iter().collect()),
        }
    }
}

#[async_trait]
impl BackupExecutor for SequenceExecutor {
    async fn perform_backup(&self, device: &Device) -> SessionResult<ArtifactPair> {
        let fail = self.outcomes.lock().await.pop_front().unwrap_or(false);
        if fail {
            return Err(timeout_error());
        }
        Ok(ArtifactPair {
            backup_path: PathBuf::from(format!("/backups/{}/backup/file.backup", device.name)),
            export_path: PathBuf::from(format!("/backups/{}/export/file.rsc", device.name)),
        })
    }

    async fn test_connection(&self, _device: &Device) -> SessionResult<()> {
        Ok(())
    }
}

/// Messenger that records every delivery, optionally failing file sends.
#[derive(Default)]
struct RecordingMessenger {
    texts: Mutex<Vec<String>>,
    files: Mutex<Vec<(PathBuf, String)>>,
    fail_files: bool,
}

impl RecordingMessenger {
    fn failing_files() -> Self {
        Self {
            fail_files: true,
            ..Self::default()
        }
    }

    async fn texts(&self) -> Vec<String> {
        self.texts.lock().await.clone()
    }

    async fn alert_count(&self) -> usize {
        self.texts()
            .await
            .iter()
            .filter(|t| t.contains("consecutive backups"))
            .count()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_text(&self, _chat_id: i64, text: &str) -> NotifyResult<()> {
        self.texts.lock().await.push(text.to_string());
        Ok(())
    }

    async fn send_file(&self, _chat_id: i64, path: &std::path::Path, caption: &str) -> NotifyResult<()> {
        if self.fail_files {
            return Err(NotifyError::Delivery("upload rejected".to_string()));
        }
        self.files
            .lock()
            .await
            .push((path.to_path_buf(), caption.to_string()));
        Ok(())
    }
}

struct Harness {
    _dir: TempDir,
    registry: Arc<DeviceRegistry>,
    history: Arc<HistoryStore>,
    messenger: Arc<RecordingMessenger>,
    orchestrator: Orchestrator,
}

fn harness(executor: ScriptedExecutor, messenger: RecordingMessenger) -> Harness {
    let dir = TempDir::new().unwrap();
    let registry = Arc::new(DeviceRegistry::open(dir.path()));
    let history = Arc::new(HistoryStore::open(dir.path()));
    let messenger = Arc::new(messenger);
    let orchestrator = Orchestrator::new(
        registry.clone(),
        history.clone(),
        Arc::new(executor),
        messenger.clone(),
        CHAT_ID,
        ALERT_THRESHOLD,
    );
    Harness {
        _dir: dir,
        registry,
        history,
        messenger,
        orchestrator,
    }
}

/// Scenario: one device that always times out. Three cycles produce three
/// failed records and exactly one escalation alert, on the third cycle.
#[tokio::test]
async fn three_failures_alert_once_at_threshold() {
    let h = harness(
        ScriptedExecutor::failing(&["core1"]),
        RecordingMessenger::default(),
    );
    h.registry.add(device("core1")).await.unwrap();

    for _ in 0..3 {
        h.orchestrator
            .run_cycle(CycleTarget::Device("core1".to_string()), false)
            .await
            .unwrap();
    }

    let records = h.history.list().unwrap();
    assert_eq!(records.len(), 3);
    for record in &records {
        assert_eq!(record.routers.len(), 1);
        assert!(!record.routers[0].success);
        assert!(record.routers[0].error.is_some());
    }

    assert_eq!(h.messenger.alert_count().await, 1);
    assert_eq!(
        h.history
            .stats_for_device("core1")
            .unwrap()
            .consecutive_failures,
        3
    );
}

/// The counter is uncapped: every failure past the threshold re-alerts.
#[tokio::test]
async fn escalation_realerts_past_threshold() {
    let h = harness(
        ScriptedExecutor::failing(&["core1"]),
        RecordingMessenger::default(),
    );
    h.registry.add(device("core1")).await.unwrap();

    for _ in 0..5 {
        h.orchestrator
            .run_cycle(CycleTarget::All, false)
            .await
            .unwrap();
    }

    // Alerts on cycles 3, 4 and 5.
    assert_eq!(h.messenger.alert_count().await, 3);
}

/// A success resets the counter, so the alert needs a full new streak.
#[tokio::test]
async fn success_resets_escalation_counter() {
    // Two failures, then a success, then two more failures: never reaches
    // three consecutive, so no alert at all.
    let executor = SequenceExecutor::new([true, true, false, true, true]);
    let dir = TempDir::new().unwrap();
    let registry = Arc::new(DeviceRegistry::open(dir.path()));
    let history = Arc::new(HistoryStore::open(dir.path()));
    let messenger = Arc::new(RecordingMessenger::default());
    registry.add(device("core1")).await.unwrap();

    let orchestrator = Orchestrator::new(
        registry,
        history.clone(),
        Arc::new(executor),
        messenger.clone(),
        CHAT_ID,
        ALERT_THRESHOLD,
    );
    for _ in 0..5 {
        orchestrator
            .run_cycle(CycleTarget::All, false)
            .await
            .unwrap();
    }

    assert_eq!(messenger.alert_count().await, 0);
    assert_eq!(
        history
            .stats_for_device("core1")
            .unwrap()
            .consecutive_failures,
        2
    );
}

/// Scenario: empty registry. No record is written and exactly one
/// "no devices" message goes out.
#[tokio::test]
async fn empty_registry_writes_no_record() {
    let h = harness(ScriptedExecutor::all_ok(), RecordingMessenger::default());

    let report = h
        .orchestrator
        .run_cycle(CycleTarget::All, false)
        .await
        .unwrap();

    assert_eq!(report, CycleReport::NoDevices);
    assert!(h.history.list().unwrap().is_empty());

    let texts = h.messenger.texts().await;
    assert_eq!(texts.len(), 1);
    assert!(texts[0].contains("No devices are registered"));
}

/// An unknown requested device produces a specific message, not an empty
/// summary.
#[tokio::test]
async fn unknown_device_writes_no_record() {
    let h = harness(ScriptedExecutor::all_ok(), RecordingMessenger::default());
    h.registry.add(device("core1")).await.unwrap();

    let report = h
        .orchestrator
        .run_cycle(CycleTarget::Device("ghost".to_string()), false)
        .await
        .unwrap();

    assert_eq!(report, CycleReport::UnknownDevice("ghost".to_string()));
    assert!(h.history.list().unwrap().is_empty());

    let texts = h.messenger.texts().await;
    assert_eq!(texts.len(), 1);
    assert!(texts[0].contains("ghost"));
}

/// Scenario: "a" succeeds and "b" fails. The record preserves registry
/// iteration order and the summary counts both ways.
#[tokio::test]
async fn mixed_outcome_record_in_registry_order() {
    let h = harness(
        ScriptedExecutor::failing(&["b"]),
        RecordingMessenger::default(),
    );
    h.registry.add(device("a")).await.unwrap();
    h.registry.add(device("b")).await.unwrap();

    let report = h
        .orchestrator
        .run_cycle(CycleTarget::All, false)
        .await
        .unwrap();

    let CycleReport::Completed(summary) = report else {
        panic!("expected a completed cycle");
    };
    assert_eq!(summary.success, 1);
    assert_eq!(summary.failed, 1);

    let records = h.history.list().unwrap();
    assert_eq!(records.len(), 1);
    let routers = &records[0].routers;
    assert_eq!(routers.len(), 2);
    assert_eq!(routers[0].name, "a");
    assert!(routers[0].success);
    assert!(routers[0].backup_path.is_some());
    assert_eq!(routers[1].name, "b");
    assert!(!routers[1].success);
    assert!(routers[1].error.is_some());
    assert!(routers[1].backup_path.is_none());
}

/// Both artifacts of a successful device are handed to the messenger.
#[tokio::test]
async fn successful_backup_delivers_both_artifacts() {
    let h = harness(ScriptedExecutor::all_ok(), RecordingMessenger::default());
    h.registry.add(device("core1")).await.unwrap();

    h.orchestrator
        .run_cycle(CycleTarget::All, false)
        .await
        .unwrap();

    let files = h.messenger.files.lock().await;
    assert_eq!(files.len(), 2);
    assert!(files[0].0.to_string_lossy().ends_with(".backup"));
    assert!(files[1].0.to_string_lossy().ends_with(".rsc"));
}

/// Delivery failures are reported per artifact but never flip the device
/// outcome: the backup itself succeeded.
#[tokio::test]
async fn delivery_failure_keeps_backup_success() {
    let h = harness(ScriptedExecutor::all_ok(), RecordingMessenger::failing_files());
    h.registry.add(device("core1")).await.unwrap();

    let report = h
        .orchestrator
        .run_cycle(CycleTarget::All, false)
        .await
        .unwrap();

    let CycleReport::Completed(summary) = report else {
        panic!("expected a completed cycle");
    };
    assert_eq!(summary.success, 1);
    assert_eq!(summary.failed, 0);

    let records = h.history.list().unwrap();
    let outcome = &records[0].routers[0];
    assert!(outcome.success);
    assert_eq!(outcome.delivery_errors.len(), 2);

    // A successful backup never feeds the escalation counter.
    assert_eq!(h.messenger.alert_count().await, 0);
}

/// Credential-shaped text in an executor error never reaches the record.
#[tokio::test]
async fn recorded_errors_are_sanitized() {
    struct LeakyExecutor;

    #[async_trait]
    impl BackupExecutor for LeakyExecutor {
        async fn perform_backup(&self, _device: &Device) -> SessionResult<ArtifactPair> {
            Err(SessionError::Command {
                command: "/export".to_string(),
                detail: "auth rejected for password=topsecret".to_string(),
            })
        }

        async fn test_connection(&self, _device: &Device) -> SessionResult<()> {
            Ok(())
        }
    }

    let dir = TempDir::new().unwrap();
    let registry = Arc::new(DeviceRegistry::open(dir.path()));
    let history = Arc::new(HistoryStore::open(dir.path()));
    let messenger = Arc::new(RecordingMessenger::default());
    registry.add(device("core1")).await.unwrap();

    let orchestrator = Orchestrator::new(
        registry,
        history.clone(),
        Arc::new(LeakyExecutor),
        messenger,
        CHAT_ID,
        ALERT_THRESHOLD,
    );
    orchestrator
        .run_cycle(CycleTarget::All, false)
        .await
        .unwrap();

    let error = history.list().unwrap()[0].routers[0]
        .error
        .clone()
        .unwrap_or_default();
    assert!(!error.contains("topsecret"));
    assert!(error.contains("[REDACTED]"));
}

/// The last-run pointer tracks the most recent cycle.
#[tokio::test]
async fn last_run_pointer_updates() {
    let h = harness(ScriptedExecutor::all_ok(), RecordingMessenger::default());
    h.registry.add(device("core1")).await.unwrap();

    assert!(h.orchestrator.last_run().await.is_none());

    h.orchestrator
        .run_cycle(CycleTarget::All, true)
        .await
        .unwrap();

    let meta = h.orchestrator.last_run().await.unwrap();
    assert!(meta.triggered_by_schedule);
    assert_eq!(meta.success, 1);
    assert_eq!(meta.failed, 0);
}
