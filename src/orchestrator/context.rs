//! Cross-cycle orchestrator state
//!
//! An explicit context object instead of process globals: consecutive
//! failure counters and the last-run pointer used by status queries. Both
//! are process-local and lost on restart.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

/// Summary of the most recently completed cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct LastRunMeta {
    pub timestamp: DateTime<Utc>,
    pub triggered_by_schedule: bool,
    pub success: usize,
    pub failed: usize,
}

/// Mutable state owned by the orchestrator across cycles.
#[derive(Debug, Default)]
pub struct OrchestratorContext {
    /// Consecutive failures per device, keyed by normalized name.
    failure_counts: HashMap<String, u32>,
    last_run: Option<LastRunMeta>,
}

fn key(name: &str) -> String {
    name.trim().to_lowercase()
}

impl OrchestratorContext {
    /// Folds one device outcome into the counters.
    ///
    /// Returns the post-update consecutive-failure count: zero after a
    /// success, incremented after a failure. The count is uncapped, so every
    /// failure at or past the alert threshold keeps returning a value above
    /// it.
    pub fn apply_outcome(&mut self, name: &str, success: bool) -> u32 {
        let entry = self.failure_counts.entry(key(name)).or_insert(0);
        if success {
            *entry = 0;
        } else {
            *entry += 1;
        }
        *entry
    }

    pub fn failure_count(&self, name: &str) -> u32 {
        self.failure_counts.get(&key(name)).copied().unwrap_or(0)
    }

    pub fn set_last_run(&mut self, meta: LastRunMeta) {
        self.last_run = Some(meta);
    }

    pub fn last_run(&self) -> Option<&LastRunMeta> {
        self.last_run.as_ref()
    }
}
