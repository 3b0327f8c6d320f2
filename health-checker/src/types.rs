use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Operational,
    Degraded,
    Down,
    Unknown,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthStatus::Operational => write!(f, "operational"),
            HealthStatus::Degraded => write!(f, "degraded"),
            HealthStatus::Down => write!(f, "down"),
            HealthStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// Outcome of checking one endpoint. Always produced, even when the probe
/// failed; failures are expressed through `status` and `message`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckResult {
    pub status: HealthStatus,
    /// Milliseconds until the response arrived, or until the probe gave up.
    pub response_time: u64,
    /// 0 when no HTTP response was received.
    pub status_code: u16,
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

impl HealthCheckResult {
    /// Placeholder for a check that could not be carried out at all.
    pub fn check_failed() -> Self {
        Self {
            status: HealthStatus::Down,
            response_time: 0,
            status_code: 0,
            timestamp: Utc::now(),
            message: "Health check failed".to_string(),
        }
    }

    pub fn received_response(&self) -> bool {
        self.status_code != 0
    }
}

/// An endpoint to check, keyed by the registry id it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub id: String,
    pub base_url: String,
}

impl Target {
    pub fn new(id: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            base_url: base_url.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BulkCheckResult {
    pub api_id: String,
    pub result: HealthCheckResult,
}

/// A directory record as persisted in the registry.
///
/// Only the fields the health checker reads or writes are typed; everything
/// else in the record is kept in `extra` so rewriting the registry is lossless.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryEntry {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub base_url: String,
    pub health_status: HealthStatus,
    pub last_checked: DateTime<Utc>,
    #[serde(
        default,
        deserialize_with = "round_millis",
        skip_serializing_if = "Option::is_none"
    )]
    pub response_time: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uptime: Option<f64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl RegistryEntry {
    pub fn new(id: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            base_url: base_url.into(),
            health_status: HealthStatus::Unknown,
            last_checked: Utc::now(),
            response_time: None,
            uptime: None,
            extra: serde_json::Map::new(),
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    pub fn target(&self) -> Target {
        Target::new(self.id.clone(), self.base_url.clone())
    }

    pub fn apply(&mut self, patch: &RegistryPatch) {
        if let Some(status) = patch.health_status {
            self.health_status = status;
        }
        if let Some(last_checked) = patch.last_checked {
            self.last_checked = last_checked;
        }
        if let Some(response_time) = patch.response_time {
            self.response_time = Some(response_time);
        }
        if let Some(uptime) = patch.uptime {
            self.uptime = Some(uptime);
        }
    }
}

/// Stored response times may be fractional; they are kept as whole milliseconds.
fn round_millis<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let millis = Option::<f64>::deserialize(deserializer)?;
    Ok(millis.map(|ms| ms.max(0.0).round() as u64))
}

/// Partial update for a registry entry. The id is not patchable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistryPatch {
    pub health_status: Option<HealthStatus>,
    pub last_checked: Option<DateTime<Utc>>,
    pub response_time: Option<u64>,
    pub uptime: Option<f64>,
}
