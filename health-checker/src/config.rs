use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use crate::error::ConfigError;

pub const DEFAULT_USER_AGENT: &str = "PublicAPIs-HealthChecker/1.0";

#[derive(Debug, Clone)]
pub struct HealthCheckerConfig {
    pub registry_path: PathBuf,
    pub http_timeout: Duration,
    pub batch_size: usize,
    pub user_agent: String,
}

impl Default for HealthCheckerConfig {
    fn default() -> Self {
        Self {
            registry_path: PathBuf::from("data/apis.json"),
            http_timeout: Duration::from_millis(10_000),
            batch_size: 5,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl HealthCheckerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup so tests need not touch the
    /// process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let config = Self {
            registry_path: lookup("REGISTRY_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.registry_path),

            http_timeout: Duration::from_millis(parse_or(
                &lookup,
                "HTTP_TIMEOUT_MILLIS",
                defaults.http_timeout.as_millis() as u64,
            )?),

            batch_size: parse_or(&lookup, "CHECK_BATCH_SIZE", defaults.batch_size)?,

            user_agent: lookup("HEALTH_CHECK_USER_AGENT").unwrap_or(defaults.user_agent),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.http_timeout.is_zero() {
            return Err(ConfigError::Invalid("HTTP timeout must be greater than 0"));
        }

        if self.batch_size == 0 {
            return Err(ConfigError::Invalid("Check batch size must be greater than 0"));
        }

        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::Invalid("User agent cannot be empty"));
        }

        Ok(())
    }

    pub fn log_configuration(&self) {
        info!(
            registry_path = %self.registry_path.display(),
            http_timeout_ms = self.http_timeout.as_millis() as u64,
            batch_size = self.batch_size,
            user_agent = %self.user_agent,
            "Health checker configuration"
        );
    }
}

pub fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Parse { key, value }),
        None => Ok(default),
    }
}
