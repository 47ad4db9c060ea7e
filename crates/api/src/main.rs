//! Bike Demand Pipeline - Main Entry Point

use api::{init_logging, run_server, AppConfig, AppState};
use inference_engine::load_model;
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args().nth(1);
    let config = AppConfig::load(config_path.as_deref())?;
    init_logging(&config.logging)?;

    info!("=== Bike Demand Pipeline v{} ===", env!("CARGO_PKG_VERSION"));

    let metrics = PrometheusBuilder::new().install_recorder()?;

    // Model is loaded once and shared read-only by every request
    let loaded = load_model(&config.model.metadata_path);
    let state = AppState::from_model(loaded, config.prediction_timeout()).with_metrics(metrics);

    run_server(&config.server.bind_addr, state).await?;

    Ok(())
}
