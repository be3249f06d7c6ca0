pub mod actions; // Business operations shared by every transport
pub mod api; // HTTP API
pub mod config;
pub mod core_state; // Process-wide state and external clients
pub mod db;
pub mod models;
pub mod pipeline; // Analyzer, funnel builder, extraction, report generation
pub mod storage; // Object storage backends

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::core_state::{CoreState, Services};
use crate::pipeline::extraction::{reconcile_stalled_work, start_extraction_worker, ExtractionQueue};

/// Start the service and block until Ctrl-C.
pub async fn run() -> Result<(), String> {
    // A missing .env file is normal
    let _ = dotenvy::dotenv();
    let config = Config::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let data_dir = config.data_dir();
    std::fs::create_dir_all(&data_dir)
        .map_err(|e| format!("Cannot create data directory {}: {e}", data_dir.display()))?;

    if config.google_api_key.is_none() {
        tracing::warn!("GOOGLE_API_KEY is not set, model calls will fail");
    }

    let services = Services::from_config(&config).map_err(|e| e.to_string())?;
    let (queue, queue_rx) = ExtractionQueue::channel();
    let listen = config.listen;
    let core = Arc::new(CoreState::new(config, services, queue));

    // Applies migrations before anything else touches the database
    core.open_db().map_err(|e| format!("Database: {e}"))?;
    tracing::info!(path = %core.db_path().display(), "Database ready");

    let worker = start_extraction_worker(core.clone(), queue_rx);
    match reconcile_stalled_work(&core) {
        Ok(summary) => tracing::info!(
            files_reset = summary.files_reset,
            reports_reset = summary.reports_reset,
            files_enqueued = summary.files_enqueued,
            "Recovered stalled work"
        ),
        Err(e) => tracing::error!("Failed to recover stalled work: {e}"),
    }

    let server = api::start_api_server(core.clone(), listen).await?;
    tracing::info!(addr = %server.session.server_addr, "Listening");

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Cannot listen for shutdown signal: {e}");
    }
    tracing::info!("Shutting down");

    server.stop().await;
    worker.shutdown().await;
    Ok(())
}
