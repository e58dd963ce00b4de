//! Storage contracts: the resource store and the reservation ledger.
//!
//! # Design
//!
//! Both traits are deliberately minimal. They provide reads and single-row
//! writes; they do **not** provide the per-resource serialization that keeps
//! the capacity invariant. That belongs to the
//! [`ReservationService`](crate::service::ReservationService).
//!
//! The one guarantee a ledger must provide on its own is uniqueness of the
//! `(resource, subject)` pair, enforced at insert time as a constraint. The
//! service checks `exists` first, but a check followed by an insert is a
//! TOCTOU window that only the constraint closes.
//!
//! # Implementations
//!
//! - `PostgresReservationStore` (in `reservations-postgres`): production
//! - `InMemoryBackend` (in `reservations-testing`): fast, deterministic tests
//!
//! # Dyn Compatibility
//!
//! These traits return [`BoxFuture`] instead of using `async fn` so they can
//! be shared as `Arc<dyn ResourceStore>` / `Arc<dyn ReservationLedger>`.

use crate::BoxFuture;
use crate::error::StoreError;
use crate::ids::{ResourceId, SubjectId};
use crate::reservation::Reservation;
use crate::resource::Resource;

/// Owner of resource records.
pub trait ResourceStore: Send + Sync {
    /// Fetch a resource. `Ok(None)` if it does not exist.
    ///
    /// # Errors
    ///
    /// [`StoreError::Unavailable`] if the backend cannot be reached.
    fn get(&self, id: ResourceId) -> BoxFuture<'_, Result<Option<Resource>, StoreError>>;

    /// Persist a newly created resource.
    ///
    /// # Errors
    ///
    /// - [`StoreError::ResourceExists`] if the id is taken
    /// - [`StoreError::Unavailable`] if the backend cannot be reached
    fn insert(&self, resource: Resource) -> BoxFuture<'_, Result<(), StoreError>>;

    /// Number of committed reservations for a resource.
    ///
    /// Derived by counting ledger rows; there is no stored counter.
    ///
    /// # Errors
    ///
    /// [`StoreError::Unavailable`] if the backend cannot be reached.
    fn count_reservations(&self, id: ResourceId) -> BoxFuture<'_, Result<u32, StoreError>>;

    /// `capacity - count_reservations`, or `Ok(None)` for an unknown resource.
    ///
    /// # Errors
    ///
    /// [`StoreError::Unavailable`] if the backend cannot be reached.
    fn available_seats(&self, id: ResourceId) -> BoxFuture<'_, Result<Option<u32>, StoreError>> {
        Box::pin(async move {
            let Some(resource) = self.get(id).await? else {
                return Ok(None);
            };
            let reserved = self.count_reservations(id).await?;
            Ok(Some(resource.available_seats(reserved)))
        })
    }

    /// Cheap connectivity check for readiness probes.
    ///
    /// # Errors
    ///
    /// [`StoreError::Unavailable`] if the backend cannot be reached.
    fn ping(&self) -> BoxFuture<'_, Result<(), StoreError>>;
}

/// Owner of reservation records.
pub trait ReservationLedger: Send + Sync {
    /// Whether the subject holds a reservation for the resource.
    ///
    /// # Errors
    ///
    /// [`StoreError::Unavailable`] if the backend cannot be reached.
    fn exists(
        &self,
        resource_id: ResourceId,
        subject_id: SubjectId,
    ) -> BoxFuture<'_, Result<bool, StoreError>>;

    /// Insert a reservation.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Conflict`] if the `(resource, subject)` pair exists
    /// - [`StoreError::Unavailable`] if the backend cannot be reached
    fn insert(&self, reservation: Reservation) -> BoxFuture<'_, Result<Reservation, StoreError>>;

    /// Remove the subject's reservation, returning it if there was one.
    ///
    /// # Errors
    ///
    /// [`StoreError::Unavailable`] if the backend cannot be reached.
    fn remove(
        &self,
        resource_id: ResourceId,
        subject_id: SubjectId,
    ) -> BoxFuture<'_, Result<Option<Reservation>, StoreError>>;

    /// All reservations for a resource, oldest first.
    ///
    /// # Errors
    ///
    /// [`StoreError::Unavailable`] if the backend cannot be reached.
    fn list(&self, resource_id: ResourceId) -> BoxFuture<'_, Result<Vec<Reservation>, StoreError>>;
}
