//! Slotbook Server: time-slot reservation engine.
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use slotbook_core::config::{AppConfig, StoreBackend};
use slotbook_core::error::AppError;
use slotbook_core::traits::{Clock, SystemClock};
use slotbook_database::connection::DatabasePool;
use slotbook_database::store::{ReservationStore, StoreDispatch};
use slotbook_service::LogNotifier;
use slotbook_worker::{CronScheduler, ExpirySweeper, StalePurgeJob, SweepRunner};

#[tokio::main]
async fn main() {
    let env = std::env::var("SLOTBOOK_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);
    tracing::info!(env = %env, "Configuration loaded");

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
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
    tracing::info!("Starting Slotbook v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Database connection + migrations ─────────────────
    let db_pool = match config.store.backend {
        StoreBackend::Postgres => {
            tracing::info!("Connecting to database...");
            let pool = DatabasePool::connect(&config.database).await?;
            if config.database.run_migrations {
                slotbook_database::migration::run_migrations(pool.pool()).await?;
            }
            Some(pool)
        }
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory reservation store; state is lost on restart");
            None
        }
    };

    // ── Step 2: Reservation store ────────────────────────────────
    let store: Arc<dyn ReservationStore> =
        Arc::new(StoreDispatch::from_config(&config.store, db_pool.as_ref())?);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // ── Step 3: Services ─────────────────────────────────────────
    let app_state = slotbook_api::AppState::new(
        config.clone(),
        Arc::clone(&store),
        Arc::clone(&clock),
        Arc::new(LogNotifier),
    );
    tracing::info!(venues = config.venues.len(), "Services initialized");

    // ── Step 4: Shutdown channel ─────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Step 5: Background worker ────────────────────────────────
    let (worker_handle, scheduler) = if config.worker.enabled {
        tracing::info!("Starting background worker...");

        let sweeper = Arc::new(ExpirySweeper::new(
            Arc::clone(&app_state.reservations),
            config.worker.sweep_batch_size,
        ));
        let runner = SweepRunner::new(sweeper, &config.worker);
        let worker_cancel = shutdown_rx.clone();
        let handle = tokio::spawn(async move {
            runner.run(worker_cancel).await;
        });

        let purge = Arc::new(StalePurgeJob::new(
            Arc::clone(&store),
            Arc::clone(&clock),
            config.worker.stale_code_retention_hours,
        ));
        let scheduler = CronScheduler::new().await?;
        scheduler
            .register_stale_purge(&config.worker.maintenance_cron, purge)
            .await?;
        scheduler.start().await?;

        tracing::info!("Background worker started");
        (Some(handle), Some(scheduler))
    } else {
        tracing::info!("Background worker disabled");
        (None, None)
    };

    // ── Step 6: Build and start HTTP server ──────────────────────
    let app = slotbook_api::build_app(app_state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!("Slotbook server listening on {}", addr);

    // ── Step 7: Graceful shutdown ────────────────────────────────
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, starting graceful shutdown...");
        let _ = shutdown_tx.send(true);
    });

    server
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    // ── Step 8: Wait for background tasks ────────────────────────
    tracing::info!("Waiting for background tasks to complete...");

    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    if let Some(handle) = worker_handle {
        let _ = tokio::time::timeout(grace, handle).await;
    }
    if let Some(mut scheduler) = scheduler {
        if let Err(e) = scheduler.shutdown().await {
            tracing::warn!(error = %e, "Scheduler did not shut down cleanly");
        }
    }
    if let Some(pool) = db_pool {
        pool.close().await;
    }

    tracing::info!("Slotbook server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
