//! `PostgreSQL` backend for capacity-bounded reservations.
//!
//! This crate provides:
//!
//! - [`PostgresReservationStore`]: the resource store and reservation ledger
//! - [`PostgresReservationService`]: `register`/`cancel` in one transaction,
//!   serialized per resource by `SELECT ... FOR UPDATE` with a `lock_timeout`
//! - [`migrate`]: creates the `resources` and `reservations` tables
//!
//! The `(resource_id, subject_id)` unique constraint enforces the ledger's
//! uniqueness independently of the row lock.
//!
//! # Example
//!
//! ```no_run
//! use reservations_postgres::{PostgresReservationService, PostgresReservationStore, migrate};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = sqlx::PgPool::connect("postgres://localhost/reservations").await?;
//! migrate(&pool).await?;
//!
//! let store = PostgresReservationStore::new(pool.clone());
//! let service = PostgresReservationService::new(pool, Duration::from_secs(2));
//! # Ok(())
//! # }
//! ```

mod rows;
mod service;
mod store;

pub use service::PostgresReservationService;
pub use store::PostgresReservationStore;

use reservations_core::StoreError;
use sqlx::PgPool;

/// Create the reservation tables if they do not exist.
///
/// Runs the SQL bundled under `migrations/`. Safe to call on every start.
///
/// # Errors
///
/// Returns [`StoreError::Unavailable`] if the schema cannot be applied.
pub async fn migrate(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| StoreError::Unavailable(format!("Migration failed: {e}")))?;

    tracing::info!("Reservation schema is up to date");
    Ok(())
}
