use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::info;

use socket_finder::{
    browser::ChromeLauncher,
    cli::{self, Cli, Command, ServeArgs},
    jobs::SearchJobTracker,
    orchestrator::SearchOrchestrator,
    resolver::VariationResolver,
    telemetry,
    vendors::VendorRegistry,
    web::{self, AppState},
    AppConfig,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = AppConfig::from_env()?;
    let _log_guard = telemetry::init_tracing(&config.logging)?;

    let launcher = Arc::new(ChromeLauncher::new(config.browser.clone()));
    let registry = Arc::new(VendorRegistry::with_browser(&config, launcher));
    let resolver = Arc::new(VariationResolver::new(config.resolver.clone()));
    let orchestrator = SearchOrchestrator::new(registry, resolver);

    match cli.command {
        Some(Command::Search(args)) => {
            cli::run_search(&orchestrator, &args, &config.output.result_file).await?;
        }
        serve => {
            let ServeArgs { host, port } = match serve {
                Some(Command::Serve(args)) => args,
                _ => ServeArgs::default(),
            };
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }

            info!("Starting Socket Finder v{}", env!("CARGO_PKG_VERSION"));
            let metrics = telemetry::install_metrics(&config.metrics)?;

            let tracker = Arc::new(SearchJobTracker::new(orchestrator, config.jobs.clone()));
            let _sweeper = tracker.spawn_sweeper();

            let state = AppState {
                tracker,
                config,
                metrics,
            };
            web::serve(state).await?;
            info!("Shutting down...");
        }
    }

    Ok(())
}
