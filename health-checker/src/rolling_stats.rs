//! Folds bulk check results back into registry entries.
//!
//! Uptime is an exponential moving average: every check moves the stored
//! value [`UPTIME_SMOOTHING_FACTOR`] of the way toward 100 (operational) or
//! 0 (down). Degraded and unknown results leave it alone.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::error::StorageError;
use crate::health_monitor::HealthMonitor;
use crate::health_storage::RegistryStore;
use crate::types::{BulkCheckResult, HealthCheckResult, HealthStatus, RegistryEntry};

pub const UPTIME_SMOOTHING_FACTOR: f64 = 0.05;

/// Next uptime estimate, or `None` when this result does not move it.
pub fn smooth_uptime(previous: f64, status: HealthStatus) -> Option<f64> {
    let sample = match status {
        HealthStatus::Operational => 100.0,
        HealthStatus::Down => 0.0,
        HealthStatus::Degraded | HealthStatus::Unknown => return None,
    };

    let next = previous * (1.0 - UPTIME_SMOOTHING_FACTOR) + sample * UPTIME_SMOOTHING_FACTOR;
    Some(round2(next.clamp(0.0, 100.0)))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// A failed probe is stored as `unknown`, not `down`.
pub fn persisted_status(checked: HealthStatus) -> HealthStatus {
    match checked {
        HealthStatus::Down => HealthStatus::Unknown,
        other => other,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusTransition {
    pub api_id: String,
    pub name: String,
    pub from: HealthStatus,
    pub to: HealthStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckSummary {
    pub operational: usize,
    pub degraded: usize,
    /// `down` and `unknown` results.
    pub failed: usize,
}

impl CheckSummary {
    pub fn from_results(results: &[BulkCheckResult]) -> Self {
        results.iter().fold(Self::default(), |mut summary, r| {
            match r.result.status {
                HealthStatus::Operational => summary.operational += 1,
                HealthStatus::Degraded => summary.degraded += 1,
                HealthStatus::Down | HealthStatus::Unknown => summary.failed += 1,
            }
            summary
        })
    }
}

#[derive(Debug, Clone)]
pub struct StatsUpdate {
    pub entries: Vec<RegistryEntry>,
    pub transitions: Vec<StatusTransition>,
}

impl StatsUpdate {
    /// Number of entries whose persisted status changed.
    pub fn changed(&self) -> usize {
        self.transitions.len()
    }
}

fn apply_result(entry: &mut RegistryEntry, result: &HealthCheckResult) -> Option<StatusTransition> {
    let previous = entry.health_status;
    let next = persisted_status(result.status);

    entry.health_status = next;
    entry.last_checked = result.timestamp;

    if result.received_response() && result.response_time > 0 {
        entry.response_time = Some(result.response_time);
    }

    if let Some(uptime) = entry.uptime {
        if let Some(smoothed) = smooth_uptime(uptime, result.status) {
            entry.uptime = Some(smoothed);
        }
    }

    (previous != next).then(|| StatusTransition {
        api_id: entry.id.clone(),
        name: entry.display_name().to_string(),
        from: previous,
        to: next,
    })
}

/// Merge `results` into `entries`. Entries without a result are returned
/// unchanged.
pub fn apply_results(entries: Vec<RegistryEntry>, results: &[BulkCheckResult]) -> StatsUpdate {
    let by_id: HashMap<&str, &HealthCheckResult> =
        results.iter().map(|r| (r.api_id.as_str(), &r.result)).collect();

    let mut transitions = Vec::new();
    let entries = entries
        .into_iter()
        .map(|mut entry| {
            if let Some(result) = by_id.get(entry.id.as_str()) {
                transitions.extend(apply_result(&mut entry, result));
            }
            entry
        })
        .collect();

    StatsUpdate { entries, transitions }
}

#[derive(Debug, Clone)]
pub struct UpdateReport {
    pub results: Vec<BulkCheckResult>,
    pub summary: CheckSummary,
    pub update: StatsUpdate,
}

/// Checks every registry entry and computes the updated registry. Persisting
/// the result is left to the caller.
pub struct RollingStatsUpdater {
    monitor: HealthMonitor,
    store: Arc<dyn RegistryStore>,
}

impl RollingStatsUpdater {
    pub fn new(monitor: HealthMonitor, store: Arc<dyn RegistryStore>) -> Self {
        Self { monitor, store }
    }

    pub async fn run(&self) -> Result<UpdateReport, StorageError> {
        let entries = self.store.list().await?;
        info!(count = entries.len(), "validating registry entries");

        let targets: Vec<_> = entries.iter().map(RegistryEntry::target).collect();
        let results = self.monitor.check_bulk(&targets).await;
        let summary = CheckSummary::from_results(&results);
        let update = apply_results(entries, &results);

        Ok(UpdateReport {
            results,
            summary,
            update,
        })
    }

    /// [`run`](Self::run) and write the updated entries back to the store.
    pub async fn run_and_persist(&self) -> Result<UpdateReport, StorageError> {
        let report = self.run().await?;
        self.store.replace_all(report.update.entries.clone()).await?;
        Ok(report)
    }
}
