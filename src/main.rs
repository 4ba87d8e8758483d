//! Pool Engine - single-player billiards session engine
//!
//! This is the main entry point. It handles:
//! - The fixed-rate simulation loop for one session
//! - A JSON-lines bridge to the renderer over stdin/stdout
//! - Background persistence of sessions, events and achievements

mod app;
mod config;
mod game;
mod store;
mod ui;
mod util;

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::EngineContext;
use crate::config::Config;
use crate::game::SessionRunner;
use crate::store::PersistenceWorker;
use crate::ui::{forward_snapshots, spawn_stdin_reader};

/// Persistence calls a finished session may still need (save, events, check)
const FLUSH_CALLS: u32 = 4;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.log_level);

    info!("Starting Pool Engine");
    info!(
        player_id = config.player_id,
        difficulty = ?config.difficulty,
        persistence = %config.persistence_addr,
        "Session configuration"
    );

    let ctx = EngineContext::new(config);
    let session = ctx.new_session().await;

    // Persistence runs beside the frame loop and never blocks it
    let (persistence, outcome_rx, worker) = PersistenceWorker::spawn(ctx.persistence.clone());

    let (runner, handle) = SessionRunner::new(
        session,
        persistence,
        outcome_rx,
        ctx.config.snapshot_interval,
    );

    let writer = tokio::spawn(forward_snapshots(
        tokio::io::stdout(),
        handle.snapshot_tx.subscribe(),
    ));
    spawn_stdin_reader(handle.input_tx.clone())?;

    let exit = runner.run(shutdown_signal()).await;
    info!(exit = ?exit, "Session finished");

    // Runner is gone; dropping the handle closes the renderer channel
    drop(handle);

    let flush_timeout = ctx.config.persistence_timeout * FLUSH_CALLS;
    match tokio::time::timeout(flush_timeout, worker).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(error = %e, "Persistence worker panicked"),
        Err(_) => warn!("Pending persistence jobs abandoned"),
    }

    let _ = writer.await;

    info!("Engine shutdown complete");
    Ok(())
}

/// Initialize tracing/logging on stderr; stdout carries renderer messages
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        }
    }
}
