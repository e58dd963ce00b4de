//! Health check and metrics endpoints.
//!
//! These endpoints are used by load balancers and monitoring systems
//! to verify service health.

use crate::error::AppError;
use crate::state::AppState;
use axum::{Json, extract::State, http::StatusCode, http::header, response::IntoResponse};
use reservations_runtime::{HealthCheck, HealthReport};
use std::time::{Duration, Instant};

/// A backend ping slower than this marks the database as degraded.
pub const SLOW_PING: Duration = Duration::from_millis(250);

/// Simple health check endpoint (for basic liveness).
///
/// Returns 200 OK to indicate the process is serving requests.
/// This endpoint does NOT check the database.
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

/// Readiness check: can the reservation backend be reached?
///
/// # Status Codes
///
/// - 200 OK: backend answered (`degraded` if slower than [`SLOW_PING`])
/// - 503 Service Unavailable: backend unreachable
///
/// # Endpoint
///
/// ```text
/// GET /health/ready
/// ```
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "checks": [{
///     "component": "database",
///     "status": "healthy",
///     "metadata": [["latency_ms", "2"]]
///   }],
///   "timestamp": "2025-01-01T00:00:00Z"
/// }
/// ```
pub async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    let started = Instant::now();
    let check = match state.queries.ping().await {
        Ok(()) => {
            let latency = started.elapsed();
            let check = if latency > SLOW_PING {
                HealthCheck::degraded(
                    "database",
                    format!("Ping took {}ms", latency.as_millis()),
                )
            } else {
                HealthCheck::healthy("database")
            };
            check.with_metadata("latency_ms", latency.as_millis().to_string())
        }
        Err(err) => {
            tracing::warn!(error = %err, "Readiness check failed");
            HealthCheck::unhealthy("database", err.to_string())
        }
    };

    let report = HealthReport::new(vec![check], state.clock.now());
    let status = if report.is_unhealthy() {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    (status, Json(report))
}

/// Prometheus scrape endpoint.
///
/// ```text
/// GET /metrics
/// ```
///
/// # Errors
///
/// 503 if no recorder was installed by this process.
#[allow(clippy::unused_async)]
pub async fn metrics(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let body = state
        .metrics
        .as_ref()
        .and_then(|exporter| exporter.render())
        .ok_or_else(|| AppError::unavailable("Metrics recorder is not installed"))?;

    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    ))
}
