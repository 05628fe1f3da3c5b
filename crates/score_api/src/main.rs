//! Entry point for the credit scoring API

use anyhow::Context;
use credit_score_api::{start_server, ConfigManager, ServingState};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    info!("Starting credit scoring API v{}", env!("CARGO_PKG_VERSION"));

    let config_manager = ConfigManager::new().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;
    let config = config_manager.get_config().clone();
    info!("Running in {:?} environment", config_manager.get_environment());

    let state = ServingState::load(&config.artifacts);
    if !state.is_ready() {
        warn!("Model or scaler missing; prediction routes will answer 503");
    }

    let addr = config.server.bind_address();
    start_server(state, &addr, config.server.max_body_bytes)
        .await
        .with_context(|| format!("failed to serve on {addr}"))?;

    info!("Credit scoring API stopped");
    Ok(())
}

fn init_logging() {
    let env = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(env)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
