//! Health classification from raw probe outcomes. No I/O happens here.

use crate::prober::ProbeOutcome;
use crate::types::HealthStatus;

/// Auth-protected endpoints slower than this are degraded.
pub const AUTH_SLOW_THRESHOLD_MS: u64 = 3000;

/// Successful responses slower than this are degraded.
pub const SLOW_THRESHOLD_MS: u64 = 5000;

/// Classify an HTTP answer by status code and latency.
///
/// Codes below 200 (including 0) give `Unknown`; use [`classify_outcome`]
/// when it matters whether a response arrived at all.
pub fn classify(status_code: u16, elapsed_ms: u64) -> HealthStatus {
    match status_code {
        500..=u16::MAX => HealthStatus::Down,
        401 | 403 if elapsed_ms > AUTH_SLOW_THRESHOLD_MS => HealthStatus::Degraded,
        401 | 403 => HealthStatus::Operational,
        400..=499 => HealthStatus::Degraded,
        200..=399 if elapsed_ms > SLOW_THRESHOLD_MS => HealthStatus::Degraded,
        200..=399 => HealthStatus::Operational,
        _ => HealthStatus::Unknown,
    }
}

pub fn classify_outcome(outcome: &ProbeOutcome) -> HealthStatus {
    if outcome.is_network_failure() {
        return HealthStatus::Down;
    }
    classify(outcome.status_code, outcome.elapsed_ms)
}

/// Human-readable summary, deterministic in its inputs.
pub fn status_message(status: HealthStatus, status_code: u16, elapsed_ms: u64) -> String {
    match status {
        HealthStatus::Operational => format!("API is healthy ({status_code}, {elapsed_ms}ms)"),
        HealthStatus::Degraded if elapsed_ms > AUTH_SLOW_THRESHOLD_MS => {
            format!("API is slow ({elapsed_ms}ms response time)")
        }
        HealthStatus::Degraded => format!("API returned status {status_code}"),
        HealthStatus::Down if status_code == 0 => "API is unreachable".to_string(),
        HealthStatus::Down => format!("API is down (status {status_code})"),
        HealthStatus::Unknown => "Unable to determine API status".to_string(),
    }
}
