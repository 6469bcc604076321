use std::path::PathBuf;
use std::sync::Arc;

use ticker_news::api::{self, AppState};
use ticker_news::config::Config;
use ticker_news::db::Repository;
use ticker_news::error::Result;
use ticker_news::feed::parse_opml_file;
use ticker_news::ingest::IngestionCoordinator;
use ticker_news::services::Scheduler;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (info by default, RUST_LOG overrides)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();

    // Check for --import flag
    let import_path = if args.len() >= 3 && args[1] == "--import" {
        Some(PathBuf::from(&args[2]))
    } else {
        None
    };

    // If import path provided, merge OPML feeds into the config file and exit
    if let Some(path) = import_path {
        let feeds = parse_opml_file(&path)?;
        let added = Config::import_feeds(&Config::config_path(), feeds)?;
        println!("Imported {} feeds from {:?}", added, path);
        return Ok(());
    }

    // Load configuration
    let config = Config::load()?;

    // Check for --refresh flag (headless single cycle)
    let headless_refresh = args.len() >= 2 && args[1] == "--refresh";

    let repository = Repository::new(&config.db_path).await?;
    let coordinator = Arc::new(IngestionCoordinator::from_config(&config, repository.clone())?);

    if headless_refresh {
        let report = coordinator.run_cycle().await;
        println!(
            "Committed {} news items from {} feeds ({} failed)",
            report.committed, report.feeds_processed, report.feeds_failed
        );
        return Ok(());
    }

    let scheduler = Scheduler::new(coordinator, config.fetch_interval());
    let scheduler_task = scheduler.start();

    let state = AppState::new(repository, scheduler);
    let result = api::serve(&config.bind_addr, state, shutdown_signal()).await;

    scheduler_task.abort();
    tracing::info!("Scheduler stopped");

    result
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
