//! # gate-api: Binary Entry Point
//!
//! Starts the HTTP server, then loads the schema store in the background.
//! Binds to `PORT` (default 8080). A failed schema load terminates the
//! process.

use anyhow::Context;
use gate_api::state::{AppConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env();
    tracing::info!(?config, "starting gate-api");

    let state = AppState::new(config.clone());
    let loader = gate_api::bootstrap::spawn_loader(config.clone(), state.gate.clone());
    let app = gate_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!("gate-api listening on {}", addr);
    let server = tokio::spawn(async move { axum::serve(listener, app).await });

    let types = loader
        .await
        .context("schema loader task failed")?
        .context("loading schema store")?;
    tracing::info!(types, "validators ready");

    server
        .await
        .context("server task failed")?
        .context("serving HTTP")?;
    Ok(())
}
