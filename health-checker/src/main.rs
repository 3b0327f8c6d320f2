use health_checker::logging::init_tracing;
use health_checker::rolling_stats::UpdateReport;
use health_checker::{HealthCheckerConfig, HealthMonitor, JsonFileRegistry, RegistryEntry, RollingStatsUpdater};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let logging = init_tracing("update_health_status");
    if let Err(e) = &logging {
        eprintln!("Failed to initialise logging: {e}");
    }

    if let Err(e) = run().await {
        if logging.is_ok() {
            error!(error = %e, "Health status update failed");
        } else {
            eprintln!("Health status update failed: {e}");
        }
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = HealthCheckerConfig::from_env()?;
    config.log_configuration();

    let store = Arc::new(JsonFileRegistry::new(config.registry_path.clone()));
    let monitor = HealthMonitor::build(&config)?;
    let updater = RollingStatsUpdater::new(monitor, store);

    let report = updater.run_and_persist().await?;
    log_report(&report);

    info!("Health status update complete!");
    Ok(())
}

fn log_report(report: &UpdateReport) {
    let names: HashMap<&str, &RegistryEntry> = report
        .update
        .entries
        .iter()
        .map(|entry| (entry.id.as_str(), entry))
        .collect();

    for r in &report.results {
        let name = names.get(r.api_id.as_str()).map_or(r.api_id.as_str(), |e| e.display_name());
        info!(
            "[{}] {} - {}ms ({})",
            r.result.status.to_string().to_uppercase(),
            name,
            r.result.response_time,
            r.result.message
        );
    }

    for t in &report.update.transitions {
        info!("{}: {} -> {}", t.name, t.from, t.to);
    }

    info!(
        operational = report.summary.operational,
        degraded = report.summary.degraded,
        failed = report.summary.failed,
        "Summary"
    );
    info!("Updated {} API health statuses.", report.update.changed());
}
