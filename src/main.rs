// =============================================================================
// Market Pulse: Main Entry Point
// =============================================================================
//
// Serves a single read-only market dashboard. Metrics are computed on demand
// and held in a single-slot cache for the configured TTL, which bounds the
// request rate against the market data provider.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod aggregator;
mod api;
mod app_state;
mod cache;
mod config;
mod error;
mod market_data;
mod metrics;
mod yahoo;

#[cfg(test)]
mod test_util;

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::config::DashboardConfig;
use crate::yahoo::YahooClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Market Pulse starting up");

    let config = Arc::new(DashboardConfig::from_env());
    info!(
        assets = config.assets.len(),
        timeframes = config.timeframes.len(),
        breadth_universe = config.breadth_universe.len(),
        "Static tables loaded"
    );

    // ── 2. Market data provider ──────────────────────────────────────────
    let client = YahooClient::new(config.yahoo_base_url.clone(), config.fetch_timeout())
        .context("failed to build market data client")?;

    // ── 3. Shared state ──────────────────────────────────────────────────
    let state = Arc::new(AppState::new(Arc::clone(&config), Arc::new(client)));

    // ── 4. HTTP server ───────────────────────────────────────────────────
    let app = api::rest::router(state);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!(addr = %config.bind_addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Market Pulse shut down complete.");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => warn!("Shutdown signal received, stopping gracefully"),
        Err(e) => warn!(error = %e, "Failed to listen for shutdown signal"),
    }
}
