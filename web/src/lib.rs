//! Axum HTTP surface for capacity-bounded reservations.
//!
//! Handlers stay thin: extract the resource id and the subject, call the
//! reservation service or the query facade, map the outcome to a status.
//! All admission rules and locking live below this crate.
//!
//! # Request Flow
//!
//! 1. **Correlation** id attached by [`correlation_id_layer`]
//! 2. **Extract** path id, JSON body and [`Subject`] from `X-Subject-Id`
//! 3. **Call** `ReservationService` (writes) or `ReservationQueries` (reads)
//! 4. **Map** `RegistrationError` to a status via [`AppError`]
//!
//! # Example
//!
//! ```ignore
//! use reservations_web::{AppState, router};
//!
//! let state = AppState::new(service, store.clone(), store, Arc::new(SystemClock));
//! let app = router(state);
//! axum::serve(listener, app).await?;
//! ```

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

// Re-export key types for convenience
pub use error::AppError;
pub use extractors::{CorrelationId, JsonBody, ResourcePath, SUBJECT_ID_HEADER, Subject};
pub use middleware::{CORRELATION_ID_HEADER, correlation_id_layer};
pub use router::router;
pub use state::AppState;

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
