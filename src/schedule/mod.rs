//! Recurring trigger schedule
//!
//! A singleton persisted override of the default cron expression, plus the
//! loop that fires scheduled cycles. An expression is validated before it is
//! persisted, so a stored override always parses; an invalid candidate
//! surfaces as a user-facing error and nothing changes. Occurrences are
//! evaluated in local time.

mod errors;

pub use errors::{ScheduleError, ScheduleResult};

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use croner::Cron;
use tracing::{error, info, warn};

use crate::orchestrator::{CycleTarget, Orchestrator};
use crate::store::DocumentStore;

/// Parses a cron expression, rejecting anything croner cannot schedule.
pub fn validate_expression(expression: &str) -> ScheduleResult<Cron> {
    Cron::new(expression)
        .parse()
        .map_err(|e| ScheduleError::InvalidExpression {
            expression: expression.to_string(),
            detail: e.to_string(),
        })
}

/// Next occurrence of `expression` strictly after `after`, if any.
pub fn next_fire_time(
    expression: &str,
    after: DateTime<Local>,
) -> ScheduleResult<Option<DateTime<Local>>> {
    let cron = validate_expression(expression)?;
    Ok(cron.find_next_occurrence(&after, false).ok())
}

/// The custom-schedule singleton document.
pub struct ScheduleStore {
    store: DocumentStore<Option<String>>,
}

impl ScheduleStore {
    /// Opens the schedule backed by `<data_dir>/schedule.json`.
    pub fn open(data_dir: &Path) -> Self {
        Self {
            store: DocumentStore::open(data_dir.join("schedule.json")),
        }
    }

    /// The stored override, if one is set.
    pub fn get(&self) -> ScheduleResult<Option<String>> {
        Ok(self.store.load()?)
    }

    /// Validates and persists an override expression.
    pub async fn set(&self, expression: &str) -> ScheduleResult<()> {
        let expression = expression.trim().to_string();
        validate_expression(&expression)?;
        self.store
            .update(move |doc| {
                *doc = Some(expression);
                Ok(())
            })
            .await
    }

    /// Removes the override, falling back to the configured default.
    pub async fn clear(&self) -> ScheduleResult<()> {
        self.store
            .update(|doc| {
                *doc = None;
                Ok(())
            })
            .await
    }

    /// The expression a scheduler should run: the override or the default.
    pub fn effective(&self, default: &str) -> ScheduleResult<String> {
        Ok(self.get()?.unwrap_or_else(|| default.to_string()))
    }
}

/// Fires a scheduled cycle at each occurrence of the effective expression.
///
/// The expression is re-read every iteration, so an override set while the
/// loop sleeps takes effect at the following occurrence. Returns when the
/// expression has no future occurrences.
pub async fn run_scheduler(
    orchestrator: Arc<Orchestrator>,
    store: Arc<ScheduleStore>,
    default_expression: String,
) -> ScheduleResult<()> {
    loop {
        let expression = store.effective(&default_expression)?;
        let Some(next) = next_fire_time(&expression, Local::now())? else {
            warn!(%expression, "schedule has no future occurrences, stopping");
            return Ok(());
        };

        info!(%expression, next = %next, "next scheduled backup");
        let wait = (next - Local::now())
            .to_std()
            .unwrap_or(Duration::ZERO);
        tokio::time::sleep(wait).await;

        if let Err(e) = orchestrator.run_cycle(CycleTarget::All, true).await {
            error!(error = %e, "scheduled backup cycle failed");
        }
    }
}
