//! Reservation HTTP router.
//!
//! Composes all handlers into a single Axum router.

use crate::handlers;
use crate::middleware::correlation_id_layer;
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

/// Create the reservation router with all endpoints.
///
/// # Routes
///
/// - `POST /api/resources` - Create a resource
/// - `GET /api/resources/:id` - Resource with availability
/// - `GET /api/resources/:id/availability` - Seats left and status
/// - `GET /api/resources/:id/reservations` - List reservations
/// - `POST /api/resources/:id/reservations` - Register the caller
/// - `DELETE /api/resources/:id/reservations` - Cancel the caller's reservation
/// - `GET /health`, `GET /health/ready` - Liveness and readiness
/// - `GET /metrics` - Prometheus text, only when the state carries an exporter
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/resources", post(handlers::create_resource))
        .route("/resources/:id", get(handlers::get_resource))
        .route("/resources/:id/availability", get(handlers::get_availability))
        .route(
            "/resources/:id/reservations",
            get(handlers::list_reservations)
                .post(handlers::register)
                .delete(handlers::cancel_reservation),
        );

    let mut app = Router::new()
        .nest("/api", api)
        .route("/health", get(handlers::health_check))
        .route("/health/ready", get(handlers::readiness_check));

    if state.metrics.is_some() {
        app = app.route("/metrics", get(handlers::metrics));
    }

    app.with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(correlation_id_layer())
}
