//! booking-server — discount-offer booking marketplace backend
//!
//! Long-running service that:
//! - Publishes slot availability and fee quotes for discount offers
//! - Creates bookings transactionally (capacity, fee, payment, insert)
//! - Drives the booking lifecycle via guarded state transitions
//! - Sweeps overdue bookings (no-show, auto-complete, expiry) on a timer

mod api;
mod auth;
mod clock;
mod config;
mod db;
mod engine;
mod error;
mod external;
mod state;
mod tasks;

use config::Config;
use state::AppState;
use tasks::{BackgroundTasks, TaskKind};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "booking_server=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;
    tracing::info!("Starting booking-server (env: {})", config.environment);

    let state = AppState::new(config).await?;

    let mut background = BackgroundTasks::new();
    let sweeper_state = state.clone();
    let sweeper_shutdown = background.shutdown_token();
    background.spawn("lifecycle_sweeper", TaskKind::Periodic, async move {
        engine::sweeper::run(sweeper_state, sweeper_shutdown).await;
    });
    background.log_summary();

    let app = api::create_router(state.clone());

    let http_addr = format!("0.0.0.0:{}", state.config.http_port);
    let listener = tokio::net::TcpListener::bind(&http_addr).await?;
    tracing::info!("booking-server HTTP listening on {http_addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    background.shutdown().await;
    tracing::info!("booking-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => tracing::error!("Failed to listen for shutdown signal: {e}"),
    }
}
