//! Health checking for the public API directory: probe endpoints, classify
//! their health, run checks in bounded batches and fold results into the
//! registry's rolling statistics.

pub mod classifier;
pub mod config;
pub mod error;
pub mod health_monitor;
pub mod health_storage;
pub mod http_client;
pub mod logging;
pub mod prober;
pub mod rolling_stats;
pub mod types;

pub use classifier::{classify, classify_outcome, status_message};
pub use config::HealthCheckerConfig;
pub use error::{ConfigError, HttpClientError, ProbeError, StorageError};
pub use health_monitor::HealthMonitor;
pub use health_storage::{InMemoryRegistry, JsonFileRegistry, RegistryStore};
pub use http_client::{HttpClient, MockBehavior, MockHttpClient, ProbeMethod, ReqwestHttpClient};
pub use prober::{parse_target, ProbeFailure, ProbeOutcome, Prober};
pub use rolling_stats::{apply_results, CheckSummary, RollingStatsUpdater, StatsUpdate};
pub use types::{BulkCheckResult, HealthCheckResult, HealthStatus, RegistryEntry, RegistryPatch, Target};
