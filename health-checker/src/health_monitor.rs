use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::classifier::{classify_outcome, status_message};
use crate::config::HealthCheckerConfig;
use crate::error::ProbeError;
use crate::http_client::{HttpClient, ReqwestHttpClient};
use crate::prober::{ProbeFailure, Prober};
use crate::types::{BulkCheckResult, HealthCheckResult, HealthStatus, Target};

/// Timeout used by [`HealthMonitor::is_reachable`].
pub const REACHABILITY_TIMEOUT: Duration = Duration::from_millis(5000);

#[derive(Clone)]
pub struct HealthMonitor {
    prober: Prober,
    batch_size: usize,
}

impl HealthMonitor {
    pub fn new(http_client: Arc<dyn HttpClient>, config: &HealthCheckerConfig) -> Self {
        Self {
            prober: Prober::new(http_client, config.http_timeout),
            batch_size: config.batch_size.max(1),
        }
    }

    /// Monitor backed by a real reqwest client.
    pub fn build(config: &HealthCheckerConfig) -> Result<Self, reqwest::Error> {
        // The prober owns the deadline; the client timeout only backs it up.
        let client = ReqwestHttpClient::new(&config.user_agent, config.http_timeout * 2)?;
        Ok(Self::new(Arc::new(client), config))
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Check one endpoint. Probe failures come back as `down` results; only a
    /// malformed target is an error.
    pub async fn check_target(
        &self,
        target: &str,
        timeout: Option<Duration>,
    ) -> Result<HealthCheckResult, ProbeError> {
        let outcome = self.prober.probe(target, timeout).await?;
        let status = classify_outcome(&outcome);

        let message = match &outcome.failure {
            None => status_message(status, outcome.status_code, outcome.elapsed_ms),
            Some(ProbeFailure::Timeout { after_ms }) => format!("Request timed out after {after_ms}ms"),
            Some(ProbeFailure::Transport(reason)) => format!("API is unreachable: {reason}"),
        };

        debug!(
            url = target,
            %status,
            status_code = outcome.status_code,
            elapsed_ms = outcome.elapsed_ms,
            "health check finished"
        );

        Ok(HealthCheckResult {
            status,
            response_time: outcome.elapsed_ms,
            status_code: outcome.status_code,
            timestamp: Utc::now(),
            message,
        })
    }

    /// Quick yes/no: did the target answer in a way that is not `down`.
    pub async fn is_reachable(&self, target: &str) -> bool {
        match self.check_target(target, Some(REACHABILITY_TIMEOUT)).await {
            Ok(result) => result.status != HealthStatus::Down,
            Err(_) => false,
        }
    }

    /// Check every target, `batch_size` at a time. Always returns one result
    /// per target, in input order; a check that panics or is rejected is
    /// reported as a failed `down` result for that target only.
    pub async fn check_bulk(&self, targets: &[Target]) -> Vec<BulkCheckResult> {
        let mut results = Vec::with_capacity(targets.len());

        for (index, batch) in targets.chunks(self.batch_size).enumerate() {
            info!(batch = index + 1, size = batch.len(), "checking batch");

            let handles: Vec<_> = batch
                .iter()
                .map(|target| {
                    let monitor = self.clone();
                    let base_url = target.base_url.clone();
                    tokio::spawn(async move { monitor.check_target(&base_url, None).await })
                })
                .collect();

            for (target, handle) in batch.iter().zip(handles) {
                let result = match handle.await {
                    Ok(Ok(result)) => result,
                    Ok(Err(e)) => {
                        warn!(api_id = %target.id, error = %e, "health check rejected target");
                        HealthCheckResult::check_failed()
                    }
                    Err(e) => {
                        warn!(api_id = %target.id, error = %e, "health check task failed");
                        HealthCheckResult::check_failed()
                    }
                };

                results.push(BulkCheckResult {
                    api_id: target.id.clone(),
                    result,
                });
            }
        }

        results
    }
}
