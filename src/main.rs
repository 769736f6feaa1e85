// =============================================================================
// Stock Pulse — Main Entry Point
// =============================================================================
//
// Serves one stock's daily candles (refreshed at fixed times each day) and a
// keyword digest of its discussion board.
//
//   stock-pulse              — run the service
//   stock-pulse snapshot [D] — fetch the quote payload once, save it under D
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod api;
mod app_state;
mod discussion;
mod error;
mod keywords;
mod quote;
mod runtime_config;
mod scheduler;
mod upstream;

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::runtime_config::RuntimeConfig;
use crate::scheduler::{RefreshScheduler, SystemClock};
use crate::upstream::{FetcherConfig, HttpFetcher};

const CONFIG_PATH: &str = "service_config.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut config = RuntimeConfig::load_or_default(CONFIG_PATH);
    config.apply_env_overrides();

    let schedule = config.schedule()?;

    info!(
        item_code = %config.item_code,
        refresh_times = ?schedule.times(),
        port = config.port,
        "Stock Pulse starting"
    );

    // ── 2. Upstream client ───────────────────────────────────────────────
    let fetcher = Arc::new(HttpFetcher::new(&FetcherConfig {
        timeout: config.request_timeout(),
        referer: config.referer(),
    })?);

    // ── 3. One-shot snapshot mode ────────────────────────────────────────
    let mut args = std::env::args().skip(1);
    if args.next().as_deref() == Some("snapshot") {
        let dir = args.next().unwrap_or_else(|| ".".to_string());
        return run_snapshot(config, fetcher, &dir).await;
    }

    // ── 4. Shared state + eager first fetch ──────────────────────────────
    let state = Arc::new(AppState::new(config, fetcher));

    info!("Loading initial quote data");
    if let Err(e) = state.quotes.refresh().await {
        warn!(kind = e.kind(), error = %e, "Initial quote fetch failed; will retry lazily and on schedule");
    }

    // ── 5. Scheduler ─────────────────────────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler = RefreshScheduler::new(
        schedule,
        Arc::new(SystemClock),
        state.config.scheduler_poll_interval(),
    );
    let scheduler_handle = tokio::spawn(scheduler.run(state.quotes.clone(), shutdown_rx));

    // ── 6. API server ────────────────────────────────────────────────────
    let bind_addr = state.config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind API server on {bind_addr}"))?;
    info!(addr = %bind_addr, "API server listening");

    let app = api::rest::router(state.clone());
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!(error = %e, "API server failed");
        }
    });

    info!("All subsystems running. Press Ctrl+C to stop.");

    // ── 7. Graceful shutdown ─────────────────────────────────────────────
    tokio::signal::ctrl_c().await?;
    warn!("Shutdown signal received — stopping gracefully");

    let _ = shutdown_tx.send(true);
    if let Err(e) = scheduler_handle.await {
        error!(error = %e, "Scheduler task ended abnormally");
    }

    info!("Stock Pulse shut down complete.");
    Ok(())
}

/// Fetch the quote payload once and write it to `dir`.
async fn run_snapshot(
    config: RuntimeConfig,
    fetcher: Arc<HttpFetcher>,
    dir: &str,
) -> anyhow::Result<()> {
    let quotes = quote::QuoteService::new(
        fetcher,
        quote::service::quote_url(&config.quote_base_url, &config.item_code),
    );

    let payload = quotes
        .fetch()
        .await
        .with_context(|| format!("quote fetch for {} failed", config.item_code))?;

    info!(
        item_code = %config.item_code,
        candles = quote::normalize(&payload).price_infos.len(),
        "quote payload fetched"
    );
    quote::snapshot_file::write_snapshot(dir, &config.item_code, &chrono::Local::now(), &payload)?;
    Ok(())
}
