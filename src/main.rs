//! DealerHub notification server.
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt};

use dealerhub_api::{AppState, Stores};
use dealerhub_core::config::AppConfig;
use dealerhub_core::error::AppError;
use dealerhub_database::DatabasePool;
use dealerhub_database::memory::MemoryDirectory;
use dealerhub_service::push::{HttpPushTransport, VapidSigner};
use dealerhub_worker::{CronScheduler, SubscriptionPurgeJob};

#[tokio::main]
async fn main() {
    let env = std::env::var("DEALERHUB_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);
    tracing::info!(env = %env, "Configuration loaded");

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting DealerHub v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Stores ───────────────────────────────────────────
    let (stores, db) = if config.database.url.is_empty() {
        tracing::warn!("No database URL configured, using in-memory stores");
        (Stores::memory(Arc::new(MemoryDirectory::new())), None)
    } else {
        tracing::info!("Connecting to database...");
        let db = DatabasePool::connect(&config.database).await?;
        if config.database.run_migrations {
            tracing::info!("Running database migrations...");
            dealerhub_database::migration::run_migrations(db.pool()).await?;
        }
        (Stores::postgres(&db), Some(db))
    };

    // ── Step 2: Web Push ─────────────────────────────────────────
    let vapid = if config.push.vapid_private_key.is_empty() {
        tracing::warn!(
            "No VAPID key configured, generated a temporary one; subscriptions will not survive a restart"
        );
        VapidSigner::generate(&config.push.subject)?
    } else {
        VapidSigner::from_config(&config.push)?
    };
    let transport = Arc::new(HttpPushTransport::new(Duration::from_secs(
        config.push.request_timeout_seconds,
    ))?);

    // ── Step 3: Services ─────────────────────────────────────────
    let subscriptions = stores.subscriptions.clone();
    let state = AppState::new(config.clone(), stores, transport, vapid);
    let realtime = state.realtime.clone();

    // ── Step 4: Scheduled maintenance ────────────────────────────
    let mut scheduler = if config.worker.enabled {
        let scheduler = CronScheduler::new(config.worker.clone()).await?;
        let purge = Arc::new(SubscriptionPurgeJob::new(subscriptions, &config.push));
        scheduler.register_subscription_purge(purge).await?;
        scheduler.start().await?;
        Some(scheduler)
    } else {
        tracing::info!("Scheduled maintenance disabled");
        None
    };

    // ── Step 5: HTTP server ──────────────────────────────────────
    let app = dealerhub_api::build_app(state);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!("DealerHub server listening on {}", addr);

    let (shutdown_tx, mut shutdown_rx) = tokio::sync::watch::channel(false);
    let server = tokio::spawn(
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.changed().await;
            })
            .into_future(),
    );

    shutdown_signal().await;
    tracing::info!("Shutdown signal received, starting graceful shutdown...");
    realtime.shutdown();
    let _ = shutdown_tx.send(true);

    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    match tokio::time::timeout(grace, server).await {
        Ok(Ok(Ok(()))) => {}
        Ok(Ok(Err(e))) => tracing::error!(error = %e, "Server error during shutdown"),
        Ok(Err(e)) => tracing::error!(error = %e, "Server task failed"),
        Err(_) => tracing::warn!("Server did not stop within the grace period"),
    }

    // ── Step 6: Cleanup ──────────────────────────────────────────
    if let Some(scheduler) = scheduler.as_mut() {
        scheduler.shutdown().await?;
    }
    if let Some(db) = db {
        db.close().await;
    }

    tracing::info!("DealerHub server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
