//! Prometheus metrics for reservation traffic.
//!
//! Recording goes through the `metrics` facade, so it is a no-op until a
//! recorder is installed. The server installs one with
//! [`MetricsExporter::install`] and serves [`MetricsExporter::render`] at
//! `GET /metrics`.
//!
//! # Example
//!
//! ```rust,no_run
//! use reservations_runtime::metrics::MetricsExporter;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut exporter = MetricsExporter::new();
//! exporter.install()?;
//!
//! if let Some(text) = exporter.render() {
//!     println!("{text}");
//! }
//! # Ok(())
//! # }
//! ```

use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use reservations_core::{RegistrationError, Reservation};
use std::time::Duration;
use thiserror::Error;

pub use metrics::{counter, histogram};

/// `register` calls by outcome.
pub const REGISTER_TOTAL: &str = "reservations_register_total";
/// `cancel` calls by outcome.
pub const CANCEL_TOTAL: &str = "reservations_cancel_total";
/// Wall time of a `register` call, lock wait included.
pub const REGISTER_DURATION: &str = "reservations_register_duration_seconds";
/// Time spent waiting for a resource lock that was granted.
pub const LOCK_WAIT: &str = "reservations_lock_wait_seconds";

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Prometheus recorder plus the handle that renders it.
#[derive(Default)]
pub struct MetricsExporter {
    handle: Option<PrometheusHandle>,
}

impl MetricsExporter {
    /// Create an exporter that has not installed a recorder yet.
    #[must_use]
    pub const fn new() -> Self {
        Self { handle: None }
    }

    /// Describe the reservation metrics and install the global recorder.
    ///
    /// # Errors
    ///
    /// Returns error if the exporter cannot be built or installed.
    ///
    /// # Note
    ///
    /// Only one global recorder can exist per process. A second install is
    /// logged and ignored, and [`render`](Self::render) then returns `None`.
    pub fn install(&mut self) -> Result<(), MetricsError> {
        let builder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("_seconds".to_string()),
                &[
                    0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
                ],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        match builder.install_recorder() {
            Ok(handle) => {
                describe_metrics();
                self.handle = Some(handle);
                tracing::info!("Prometheus recorder installed");
                Ok(())
            }
            Err(e) => {
                let err_msg = e.to_string();
                if err_msg.contains("already initialized") {
                    tracing::warn!("Metrics recorder already initialized, skipping re-initialization");
                    Ok(())
                } else {
                    Err(MetricsError::Install(err_msg))
                }
            }
        }
    }

    /// Current metrics in Prometheus text format.
    ///
    /// Returns `None` if this exporter did not install the recorder.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

fn describe_metrics() {
    describe_counter!(REGISTER_TOTAL, "Register calls by outcome");
    describe_counter!(CANCEL_TOTAL, "Cancel calls by outcome");
    describe_histogram!(REGISTER_DURATION, "Time taken by register, lock wait included");
    describe_histogram!(LOCK_WAIT, "Time spent waiting for a granted resource lock");
}

fn outcome(result: &Result<Reservation, RegistrationError>) -> &'static str {
    match result {
        Ok(_) => "success",
        Err(err) => err.kind(),
    }
}

/// Reservation metrics recorder.
pub struct ReservationMetrics;

impl ReservationMetrics {
    /// Record a finished `register` call.
    pub fn record_register(result: &Result<Reservation, RegistrationError>, duration: Duration) {
        counter!(REGISTER_TOTAL, "outcome" => outcome(result)).increment(1);
        histogram!(REGISTER_DURATION).record(duration.as_secs_f64());
    }

    /// Record a finished `cancel` call.
    pub fn record_cancel(result: &Result<Reservation, RegistrationError>) {
        counter!(CANCEL_TOTAL, "outcome" => outcome(result)).increment(1);
    }

    /// Record how long a granted lock was waited for.
    pub fn record_lock_wait(duration: Duration) {
        histogram!(LOCK_WAIT).record(duration.as_secs_f64());
    }
}
