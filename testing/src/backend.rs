//! In-memory store and ledger for fast, deterministic tests
//!
//! [`InMemoryBackend`] implements both [`ResourceStore`] and
//! [`ReservationLedger`] over one shared map, so a single `Arc` can be handed
//! to the service and the query facade alike. It enforces the
//! `(resource, subject)` uniqueness constraint on insert, like the database
//! does, and offers a few switches for injecting failures.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Lock poisoning only happens after a test already panicked

use reservations_core::{
    BoxFuture, Reservation, ReservationLedger, Resource, ResourceId, ResourceStore, StoreError,
    SubjectId,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

#[derive(Debug, Default)]
struct State {
    resources: HashMap<ResourceId, Resource>,
    // Insertion order doubles as commit order.
    reservations: Vec<Reservation>,
}

#[derive(Debug, Default)]
struct Faults {
    fail_next_insert: AtomicBool,
    hide_existing: AtomicBool,
    unavailable: AtomicBool,
}

/// In-memory resource store and reservation ledger.
///
/// # Example
///
/// ```
/// use reservations_core::{ReservationLedger, Reservation, SubjectId};
/// use reservations_testing::{InMemoryBackend, fixtures, test_clock};
/// use reservations_core::environment::Clock;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let clock = test_clock();
/// let backend = InMemoryBackend::new();
/// let resource = backend.seed(fixtures::resource(2, None, clock.now()));
///
/// let subject = SubjectId::new();
/// backend.insert(Reservation::new(resource.id, subject, clock.now())).await?;
/// assert!(backend.exists(resource.id, subject).await?);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryBackend {
    state: Arc<RwLock<State>>,
    faults: Arc<Faults>,
    latency: Option<Duration>,
}

impl InMemoryBackend {
    /// Create an empty backend
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long at the start of every operation.
    ///
    /// Widens the window between a check and the following write, which
    /// makes races in an unserialized caller show up reliably.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Store a resource directly and return it.
    pub fn seed(&self, resource: Resource) -> Resource {
        self.state
            .write()
            .unwrap()
            .resources
            .insert(resource.id, resource.clone());
        resource
    }

    /// Number of reservations held for `resource_id`
    #[must_use]
    pub fn reservation_count(&self, resource_id: ResourceId) -> usize {
        self.state
            .read()
            .unwrap()
            .reservations
            .iter()
            .filter(|r| r.resource_id == resource_id)
            .count()
    }

    /// Make the next ledger insert fail with [`StoreError::Unavailable`].
    pub fn fail_next_insert(&self) {
        self.faults.fail_next_insert.store(true, Ordering::SeqCst);
    }

    /// Make `exists` always answer `false`, leaving only the insert
    /// constraint to catch duplicates.
    pub fn hide_existing_reservations(&self, hide: bool) {
        self.faults.hide_existing.store(hide, Ordering::SeqCst);
    }

    /// Make every operation fail with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.faults.unavailable.store(unavailable, Ordering::SeqCst);
    }

    async fn enter(&self) -> Result<(), StoreError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.faults.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("in-memory backend switched off".into()));
        }
        Ok(())
    }
}

impl ResourceStore for InMemoryBackend {
    fn get(&self, id: ResourceId) -> BoxFuture<'_, Result<Option<Resource>, StoreError>> {
        Box::pin(async move {
            self.enter().await?;
            Ok(self.state.read().unwrap().resources.get(&id).cloned())
        })
    }

    fn insert(&self, resource: Resource) -> BoxFuture<'_, Result<(), StoreError>> {
        Box::pin(async move {
            self.enter().await?;
            let mut state = self.state.write().unwrap();
            if state.resources.contains_key(&resource.id) {
                return Err(StoreError::ResourceExists(resource.id));
            }
            state.resources.insert(resource.id, resource);
            Ok(())
        })
    }

    fn count_reservations(&self, id: ResourceId) -> BoxFuture<'_, Result<u32, StoreError>> {
        Box::pin(async move {
            self.enter().await?;
            u32::try_from(self.reservation_count(id))
                .map_err(|e| StoreError::Unavailable(e.to_string()))
        })
    }

    fn ping(&self) -> BoxFuture<'_, Result<(), StoreError>> {
        Box::pin(self.enter())
    }
}

impl ReservationLedger for InMemoryBackend {
    fn exists(
        &self,
        resource_id: ResourceId,
        subject_id: SubjectId,
    ) -> BoxFuture<'_, Result<bool, StoreError>> {
        Box::pin(async move {
            self.enter().await?;
            if self.faults.hide_existing.load(Ordering::SeqCst) {
                return Ok(false);
            }
            Ok(self
                .state
                .read()
                .unwrap()
                .reservations
                .iter()
                .any(|r| r.resource_id == resource_id && r.subject_id == subject_id))
        })
    }

    fn insert(&self, reservation: Reservation) -> BoxFuture<'_, Result<Reservation, StoreError>> {
        Box::pin(async move {
            self.enter().await?;
            if self.faults.fail_next_insert.swap(false, Ordering::SeqCst) {
                return Err(StoreError::Unavailable("injected insert failure".into()));
            }

            let mut state = self.state.write().unwrap();
            if !state.resources.contains_key(&reservation.resource_id) {
                return Err(StoreError::Unavailable(format!(
                    "reservation references unknown resource {}",
                    reservation.resource_id
                )));
            }
            if state.reservations.iter().any(|r| {
                r.resource_id == reservation.resource_id && r.subject_id == reservation.subject_id
            }) {
                return Err(StoreError::Conflict {
                    resource_id: reservation.resource_id,
                    subject_id: reservation.subject_id,
                });
            }
            state.reservations.push(reservation.clone());
            Ok(reservation)
        })
    }

    fn remove(
        &self,
        resource_id: ResourceId,
        subject_id: SubjectId,
    ) -> BoxFuture<'_, Result<Option<Reservation>, StoreError>> {
        Box::pin(async move {
            self.enter().await?;
            let mut state = self.state.write().unwrap();
            let position = state
                .reservations
                .iter()
                .position(|r| r.resource_id == resource_id && r.subject_id == subject_id);
            Ok(position.map(|index| state.reservations.remove(index)))
        })
    }

    fn list(&self, resource_id: ResourceId) -> BoxFuture<'_, Result<Vec<Reservation>, StoreError>> {
        Box::pin(async move {
            self.enter().await?;
            let mut reservations: Vec<_> = self
                .state
                .read()
                .unwrap()
                .reservations
                .iter()
                .filter(|r| r.resource_id == resource_id)
                .cloned()
                .collect();
            reservations.sort_by_key(|r| r.created_at);
            Ok(reservations)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{fixtures, test_clock};
    use reservations_core::environment::Clock;

    #[tokio::test]
    async fn duplicate_insert_is_a_conflict() {
        let clock = test_clock();
        let backend = InMemoryBackend::new();
        let resource = backend.seed(fixtures::resource(3, None, clock.now()));
        let subject = SubjectId::new();

        ReservationLedger::insert(&backend, Reservation::new(resource.id, subject, clock.now()))
            .await
            .unwrap();
        let err = ReservationLedger::insert(
            &backend,
            Reservation::new(resource.id, subject, clock.now()),
        )
        .await
        .unwrap_err();

        assert_eq!(
            err,
            StoreError::Conflict {
                resource_id: resource.id,
                subject_id: subject
            }
        );
        assert_eq!(backend.reservation_count(resource.id), 1);
    }

    #[tokio::test]
    async fn duplicate_resource_is_rejected() {
        let clock = test_clock();
        let backend = InMemoryBackend::new();
        let resource = fixtures::resource(3, None, clock.now());

        ResourceStore::insert(&backend, resource.clone()).await.unwrap();
        assert_eq!(
            ResourceStore::insert(&backend, resource.clone()).await,
            Err(StoreError::ResourceExists(resource.id))
        );
    }

    #[tokio::test]
    async fn list_is_oldest_first() {
        let clock = test_clock();
        let backend = InMemoryBackend::new();
        let resource = backend.seed(fixtures::resource(3, None, clock.now()));

        let later = Reservation::new(
            resource.id,
            SubjectId::new(),
            clock.now() + chrono::Duration::minutes(5),
        );
        let earlier = Reservation::new(resource.id, SubjectId::new(), clock.now());
        ReservationLedger::insert(&backend, later.clone()).await.unwrap();
        ReservationLedger::insert(&backend, earlier.clone()).await.unwrap();

        assert_eq!(backend.list(resource.id).await.unwrap(), vec![earlier, later]);
    }

    #[tokio::test]
    async fn injected_failure_fires_once() {
        let clock = test_clock();
        let backend = InMemoryBackend::new();
        let resource = backend.seed(fixtures::resource(3, None, clock.now()));

        backend.fail_next_insert();
        let first = ReservationLedger::insert(
            &backend,
            Reservation::new(resource.id, SubjectId::new(), clock.now()),
        )
        .await;
        let second = ReservationLedger::insert(
            &backend,
            Reservation::new(resource.id, SubjectId::new(), clock.now()),
        )
        .await;

        assert!(matches!(first, Err(StoreError::Unavailable(_))));
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn switched_off_backend_fails_ping() {
        let backend = InMemoryBackend::new();
        assert!(backend.ping().await.is_ok());

        backend.set_unavailable(true);
        assert!(matches!(backend.ping().await, Err(StoreError::Unavailable(_))));
    }
}
