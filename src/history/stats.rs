//! Per-device and overall statistics over the run history
//!
//! Records are stored newest-first; the consecutive-failure walk relies on
//! that ordering and stops at the first success it meets.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::RunRecord;
use crate::registry::names_match;

/// Statistics for one device across all retained records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceStats {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub success_rate: f64,
    pub last_successful_run: Option<DateTime<Utc>>,
    /// Failures since the most recent success, walking newest to oldest.
    pub consecutive_failures: usize,
}

/// Aggregate statistics across every retained record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverallStats {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub success_rate: f64,
    pub total_runs: usize,
}

fn rate(success: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        success as f64 / total as f64
    }
}

/// Computes statistics for one device. `records` must be newest-first.
pub fn device_stats(records: &[RunRecord], name: &str) -> DeviceStats {
    let mut total = 0;
    let mut success = 0;
    let mut last_successful_run = None;
    let mut consecutive_failures = 0;
    let mut counting = true;

    for record in records {
        let Some(outcome) = record.routers.iter().find(|r| names_match(&r.name, name)) else {
            continue;
        };
        total += 1;
        if outcome.success {
            success += 1;
            if last_successful_run.is_none() {
                last_successful_run = Some(record.timestamp);
            }
            counting = false;
        } else if counting {
            consecutive_failures += 1;
        }
    }

    DeviceStats {
        total,
        success,
        failed: total - success,
        success_rate: rate(success, total),
        last_successful_run,
        consecutive_failures,
    }
}

/// Computes aggregate statistics across all records.
pub fn overall_stats(records: &[RunRecord]) -> OverallStats {
    let mut total = 0;
    let mut success = 0;

    for record in records {
        for outcome in &record.routers {
            total += 1;
            if outcome.success {
                success += 1;
            }
        }
    }

    OverallStats {
        total,
        success,
        failed: total - success,
        success_rate: rate(success, total),
        total_runs: records.len(),
    }
}
