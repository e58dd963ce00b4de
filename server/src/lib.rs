//! Reservation server: wires configuration, the `PostgreSQL` backend, metrics
//! and the HTTP router, and runs until a shutdown signal.

pub mod config;

pub use config::{Config, ConfigError, DatabaseConfig, ServerConfig};

use axum::Router;
use reservations_core::StoreError;
use reservations_core::environment::SystemClock;
use reservations_postgres::{PostgresReservationService, PostgresReservationStore, migrate};
use reservations_runtime::metrics::{MetricsError, MetricsExporter};
use reservations_web::{AppState, router};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::future::IntoFuture;
use std::sync::Arc;
use thiserror::Error;
use tokio::signal;
use tokio::sync::watch;
use tracing::{info, warn};

/// Errors that stop the server from starting or running.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Bad configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The database could not be reached.
    #[error("Failed to connect to database: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema bootstrap failed.
    #[error("Failed to prepare schema: {0}")]
    Schema(#[from] StoreError),

    /// The metrics recorder could not be installed.
    #[error(transparent)]
    Metrics(#[from] MetricsError),

    /// Binding or serving failed.
    #[error("Server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Open the connection pool described by `config`.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if no connection can be established.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(Some(config.idle_timeout))
        .connect(&config.url)
        .await
}

/// Build the application router over an open pool.
///
/// # Errors
///
/// Returns [`ServerError`] if migrations or the metrics recorder fail.
pub async fn build_app(config: &Config, pool: PgPool) -> Result<Router, ServerError> {
    if config.database.run_migrations {
        migrate(&pool).await?;
    }

    let store = Arc::new(PostgresReservationStore::new(pool.clone()));
    let service = Arc::new(PostgresReservationService::new(pool, config.lock_timeout));
    let mut state = AppState::new(service, store.clone(), store, Arc::new(SystemClock));

    if config.metrics_enabled {
        let mut exporter = MetricsExporter::new();
        exporter.install()?;
        state = state.with_metrics(Arc::new(exporter));
    }

    Ok(router(state))
}

/// Connect, build and serve until Ctrl+C or SIGTERM.
///
/// After the signal, in-flight requests get `shutdown_timeout` to finish.
///
/// # Errors
///
/// Returns [`ServerError`] if startup fails or the listener errors.
pub async fn run(config: Config) -> Result<(), ServerError> {
    let pool = connect(&config.database).await?;
    info!(
        max_connections = config.database.max_connections,
        "Database pool ready"
    );

    let app = build_app(&config, pool.clone()).await?;

    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(
        address = %addr,
        lock_timeout_ms = u64::try_from(config.lock_timeout.as_millis()).unwrap_or(u64::MAX),
        metrics = config.metrics_enabled,
        "Reservation server listening"
    );

    let (stopping_tx, mut stopping_rx) = watch::channel(false);
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            let _ = stopping_tx.send(true);
        })
        .into_future();

    let grace = config.server.shutdown_timeout;
    let deadline = async move {
        while !*stopping_rx.borrow_and_update() {
            if stopping_rx.changed().await.is_err() {
                return;
            }
        }
        tokio::time::sleep(grace).await;
    };

    tokio::select! {
        result = server => result?,
        () = deadline => {
            warn!(timeout_secs = grace.as_secs(), "Graceful shutdown timed out, dropping open connections");
        }
    }

    pool.close().await;
    info!("Server stopped");
    Ok(())
}

/// Wait for shutdown signal (SIGTERM or Ctrl+C).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}
