use tracing_subscriber::filter::ParseError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter directives for `RUST_ENV`, used when `RUST_LOG` is unset.
pub fn default_filter(crate_name: &str, rust_env: Option<&str>) -> String {
    match rust_env {
        Some("production") => format!("{crate_name}=info,health_checker=info,tower_http=warn,axum=warn"),
        Some("development") => format!("{crate_name}=debug,health_checker=debug,tower_http=debug,axum=trace"),
        Some("test") => format!("{crate_name}=warn,health_checker=warn,tower_http=warn"),
        _ => format!("{crate_name}=info,health_checker=info,tower_http=warn,axum=warn"),
    }
}

/// Install the global subscriber. `LOG_FORMAT=json` switches to JSON lines.
pub fn init_tracing(crate_name: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let rust_log = std::env::var("RUST_LOG").ok();
    let rust_env = std::env::var("RUST_ENV").ok();
    let (filter, rejected) = env_filter(crate_name, rust_log.as_deref(), rust_env.as_deref())?;

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_file(cfg!(debug_assertions))
                    .compact(),
            )
            .try_init()?;
    }

    if let Some(e) = rejected {
        tracing::warn!(error = %e, "Ignoring invalid RUST_LOG, using defaults");
    }

    Ok(())
}

/// `RUST_LOG` when it parses, otherwise the `RUST_ENV` defaults together with
/// the parse error so it can be reported once logging is up.
pub fn env_filter(
    crate_name: &str,
    rust_log: Option<&str>,
    rust_env: Option<&str>,
) -> Result<(EnvFilter, Option<ParseError>), ParseError> {
    if let Some(directives) = rust_log {
        match EnvFilter::try_new(directives) {
            Ok(filter) => return Ok((filter, None)),
            Err(e) => {
                let fallback = EnvFilter::try_new(default_filter(crate_name, rust_env))?;
                return Ok((fallback, Some(e)));
            }
        }
    }

    Ok((EnvFilter::try_new(default_filter(crate_name, rust_env))?, None))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_by_environment() {
        assert!(default_filter("server", Some("development")).starts_with("server=debug"));
        assert!(default_filter("server", Some("test")).starts_with("server=warn"));
        assert_eq!(default_filter("server", None), default_filter("server", Some("production")));
    }

    #[test]
    fn test_invalid_rust_log_falls_back_to_defaults() {
        let (filter, rejected) = env_filter("server", Some("server=loud"), Some("development")).unwrap();

        assert!(rejected.is_some());
        assert!(filter.to_string().contains("server=debug"));
    }

    #[test]
    fn test_valid_rust_log_is_used() {
        let (filter, rejected) = env_filter("server", Some("server=trace"), None).unwrap();

        assert!(rejected.is_none());
        assert!(filter.to_string().contains("server=trace"));
    }
}
