//! Application state for Axum handlers.

use reservations_core::environment::Clock;
use reservations_core::{ReservationLedger, ReservationQueries, ReservationService, ResourceStore};
use reservations_runtime::metrics::MetricsExporter;
use std::sync::Arc;

/// Shared state behind every handler.
///
/// Backend-agnostic: the server wires the Postgres store and service, tests
/// wire the in-memory backend and the locking service.
#[derive(Clone)]
pub struct AppState {
    /// Atomic `register`/`cancel`.
    pub service: Arc<dyn ReservationService>,
    /// Resource persistence, for creation.
    pub resources: Arc<dyn ResourceStore>,
    /// Lock-free read views.
    pub queries: ReservationQueries,
    /// Source of `now` for admission decisions.
    pub clock: Arc<dyn Clock>,
    /// Prometheus exporter, when metrics are enabled.
    pub metrics: Option<Arc<MetricsExporter>>,
}

impl AppState {
    /// Assemble the state. Metrics are off until [`with_metrics`](Self::with_metrics).
    #[must_use]
    pub fn new(
        service: Arc<dyn ReservationService>,
        resources: Arc<dyn ResourceStore>,
        ledger: Arc<dyn ReservationLedger>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            service,
            queries: ReservationQueries::new(Arc::clone(&resources), ledger),
            resources,
            clock,
            metrics: None,
        }
    }

    /// Serve `GET /metrics` from this exporter.
    #[must_use]
    pub fn with_metrics(mut self, exporter: Arc<MetricsExporter>) -> Self {
        self.metrics = Some(exporter);
        self
    }
}
