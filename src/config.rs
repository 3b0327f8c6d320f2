use health_checker::config::parse_or;
use health_checker::{ConfigError, HealthCheckerConfig};
use std::time::Duration;
use tracing::info;

pub const PROXY_USER_AGENT: &str = "PublicAPIs-Playground/1.0";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_address: String,
    pub proxy_timeout: Duration,
    pub checker: HealthCheckerConfig,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let config = Self {
            bind_address: lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            proxy_timeout: Duration::from_millis(parse_or(&lookup, "PROXY_TIMEOUT_MILLIS", 15_000)?),
            checker: HealthCheckerConfig::from_lookup(&lookup)?,
        };

        if config.proxy_timeout.is_zero() {
            return Err(ConfigError::Invalid("Proxy timeout must be greater than 0"));
        }

        Ok(config)
    }

    pub fn log_configuration(&self) {
        info!(
            bind_address = %self.bind_address,
            proxy_timeout_ms = self.proxy_timeout.as_millis() as u64,
            "Server configuration"
        );
        self.checker.log_configuration();
    }
}
