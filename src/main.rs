mod config;
mod error;
mod proxy;
mod routes;
#[cfg(test)]
mod test_support;

use anyhow::Result;
use health_checker::logging::init_tracing;
use health_checker::{HealthMonitor, JsonFileRegistry};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::{ServerConfig, PROXY_USER_AGENT};
use crate::routes::{build_router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("server").map_err(|e| anyhow::anyhow!(e))?;

    let config = ServerConfig::from_env()?;
    config.log_configuration();

    let proxy_client = Client::builder()
        .user_agent(PROXY_USER_AGENT)
        .pool_max_idle_per_host(20)
        .pool_idle_timeout(Duration::from_secs(60))
        .tcp_keepalive(Duration::from_secs(30))
        .tcp_nodelay(true)
        .build()?;

    let state = AppState {
        monitor: HealthMonitor::build(&config.checker)?,
        registry: Arc::new(JsonFileRegistry::new(config.checker.registry_path.clone())),
        proxy_client,
        proxy_timeout: config.proxy_timeout,
    };

    let app = build_router(state);

    info!("Server starting on {}", config.bind_address);

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
