mod config;
mod engine;
mod evaluator;
mod handlers;
mod provider;
mod routes;

use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

use config::Config;
use engine::JudgeEngine;

pub struct AppState {
    pub engine: JudgeEngine,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    info!("Arbiter API booting...");

    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        provider = ?config.provider,
        provider_url = %config.provider_url,
        compile_timeout_ms = config.compile_timeout_ms,
        run_timeout_ms = config.run_timeout_ms,
        "Configuration loaded"
    );

    let provider = provider::build_provider(&config);
    let state = Arc::new(AppState {
        engine: JudgeEngine::new(provider),
    });

    // Build router
    let app = Router::new().merge(routes::routes()).with_state(state);

    // Start server
    let listener = TcpListener::bind(&config.bind_addr).await?;

    info!("HTTP server listening on {}", config.bind_addr);
    info!("Ready to accept submissions");

    axum::serve(listener, app).await?;

    Ok(())
}
