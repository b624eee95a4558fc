//! Logging and metrics setup.

use anyhow::{anyhow, Result};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LoggingConfig, MetricsConfig};

pub mod metric_names {
    pub const SEARCHES_SUBMITTED: &str = "socket_finder_searches_submitted_total";
    pub const VENDOR_RESULTS: &str = "socket_finder_vendor_results_total";
    pub const QUERY_OUTCOMES: &str = "socket_finder_query_outcomes_total";
    pub const AMBIGUOUS_PAGES: &str = "socket_finder_ambiguous_pages_total";
    pub const VENDOR_DURATION: &str = "socket_finder_vendor_duration_seconds";
}

const LOG_FILE_PREFIX: &str = "socket-finder.log";

/// Installs the global subscriber. `RUST_LOG` takes precedence over the
/// configured filter. The returned guard must be held for the life of the
/// process when file logging is on.
pub fn init_tracing(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .map_err(|e| anyhow!("Invalid log filter '{}': {}", config.filter, e))?;

    let console_layer = fmt::layer().with_target(true);

    match &config.directory {
        Some(directory) => {
            std::fs::create_dir_all(directory)
                .map_err(|e| anyhow!("Failed to create log directory {}: {}", directory, e))?;
            let file_appender = tracing_appender::rolling::daily(directory, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(file_appender);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(console_layer)
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .try_init()
                .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(console_layer)
                .try_init()
                .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;
            Ok(None)
        }
    }
}

/// Installs the Prometheus recorder when metrics are enabled.
pub fn install_metrics(config: &MetricsConfig) -> Result<Option<PrometheusHandle>> {
    if !config.enabled {
        return Ok(None);
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow!("Failed to install metrics recorder: {}", e))?;
    tracing::info!("Prometheus metrics enabled");
    Ok(Some(handle))
}
