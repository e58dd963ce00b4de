//! Query facade: read-only projections over the store and ledger.
//!
//! Queries take no lock. A caller may see a seat as available a moment before
//! an in-flight `register` consumes it; the service is the only authority on
//! whether a registration succeeds.

use crate::error::RegistrationError;
use crate::ids::{ResourceId, SubjectId};
use crate::reservation::Reservation;
use crate::resource::{RegistrationStatus, Resource};
use crate::store::{ReservationLedger, ResourceStore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Point-in-time availability of a resource.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    /// The resource.
    pub resource_id: ResourceId,
    /// Total seats.
    pub capacity: u32,
    /// Committed reservations.
    pub reserved: u32,
    /// `capacity - reserved`.
    pub available_seats: u32,
    /// Derived status at the time of the query.
    pub status: RegistrationStatus,
}

/// Lock-free read views.
#[derive(Clone)]
pub struct ReservationQueries {
    store: Arc<dyn ResourceStore>,
    ledger: Arc<dyn ReservationLedger>,
}

impl ReservationQueries {
    /// Build the facade over a store and a ledger.
    #[must_use]
    pub fn new(store: Arc<dyn ResourceStore>, ledger: Arc<dyn ReservationLedger>) -> Self {
        Self { store, ledger }
    }

    /// Fetch a resource.
    ///
    /// # Errors
    ///
    /// [`RegistrationError::ResourceNotFound`] or [`RegistrationError::Unavailable`].
    pub async fn resource(&self, id: ResourceId) -> Result<Resource, RegistrationError> {
        self.store
            .get(id)
            .await?
            .ok_or(RegistrationError::ResourceNotFound(id))
    }

    /// Seats left on a resource.
    ///
    /// # Errors
    ///
    /// [`RegistrationError::ResourceNotFound`] or [`RegistrationError::Unavailable`].
    pub async fn available_seats(&self, id: ResourceId) -> Result<u32, RegistrationError> {
        self.store
            .available_seats(id)
            .await?
            .ok_or(RegistrationError::ResourceNotFound(id))
    }

    /// `closed` if the deadline passed, else `full` if no seats, else `open`.
    ///
    /// # Errors
    ///
    /// [`RegistrationError::ResourceNotFound`] or [`RegistrationError::Unavailable`].
    pub async fn registration_status(
        &self,
        id: ResourceId,
        now: DateTime<Utc>,
    ) -> Result<RegistrationStatus, RegistrationError> {
        Ok(self.availability(id, now).await?.status)
    }

    /// Capacity, count, seats left and status in one read.
    ///
    /// # Errors
    ///
    /// [`RegistrationError::ResourceNotFound`] or [`RegistrationError::Unavailable`].
    pub async fn availability(
        &self,
        id: ResourceId,
        now: DateTime<Utc>,
    ) -> Result<Availability, RegistrationError> {
        let resource = self.resource(id).await?;
        let reserved = self.store.count_reservations(id).await?;
        Ok(Availability {
            resource_id: id,
            capacity: resource.capacity,
            reserved,
            available_seats: resource.available_seats(reserved),
            status: resource.status_at(now, reserved),
        })
    }

    /// Whether the subject holds a seat.
    ///
    /// # Errors
    ///
    /// [`RegistrationError::Unavailable`] on backend failure.
    pub async fn is_registered(
        &self,
        resource_id: ResourceId,
        subject_id: SubjectId,
    ) -> Result<bool, RegistrationError> {
        Ok(self.ledger.exists(resource_id, subject_id).await?)
    }

    /// Reservations for a resource, oldest first.
    ///
    /// # Errors
    ///
    /// [`RegistrationError::ResourceNotFound`] or [`RegistrationError::Unavailable`].
    pub async fn reservations(
        &self,
        resource_id: ResourceId,
    ) -> Result<Vec<Reservation>, RegistrationError> {
        // Distinguish "no reservations" from "no such resource".
        self.resource(resource_id).await?;
        Ok(self.ledger.list(resource_id).await?)
    }

    /// Backend connectivity check.
    ///
    /// # Errors
    ///
    /// [`RegistrationError::Unavailable`] if the store cannot be reached.
    pub async fn ping(&self) -> Result<(), RegistrationError> {
        Ok(self.store.ping().await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::BoxFuture;
    use crate::error::StoreError;
    use crate::resource::NewResource;
    use chrono::{Duration, TimeZone};
    use std::sync::Mutex;

    /// Minimal single-resource backend, enough to exercise the facade.
    struct Fixed {
        resource: Resource,
        reservations: Mutex<Vec<Reservation>>,
    }

    impl ResourceStore for Fixed {
        fn get(&self, id: ResourceId) -> BoxFuture<'_, Result<Option<Resource>, StoreError>> {
            let found = (id == self.resource.id).then(|| self.resource.clone());
            Box::pin(async move { Ok(found) })
        }

        fn insert(&self, _resource: Resource) -> BoxFuture<'_, Result<(), StoreError>> {
            Box::pin(async { Err(StoreError::Unavailable("read-only".into())) })
        }

        fn count_reservations(&self, _id: ResourceId) -> BoxFuture<'_, Result<u32, StoreError>> {
            let count = u32::try_from(self.reservations.lock().unwrap().len()).unwrap();
            Box::pin(async move { Ok(count) })
        }

        fn ping(&self) -> BoxFuture<'_, Result<(), StoreError>> {
            Box::pin(async { Ok(()) })
        }
    }

    impl ReservationLedger for Fixed {
        fn exists(
            &self,
            _resource_id: ResourceId,
            subject_id: SubjectId,
        ) -> BoxFuture<'_, Result<bool, StoreError>> {
            let found = self
                .reservations
                .lock()
                .unwrap()
                .iter()
                .any(|r| r.subject_id == subject_id);
            Box::pin(async move { Ok(found) })
        }

        fn insert(&self, reservation: Reservation) -> BoxFuture<'_, Result<Reservation, StoreError>> {
            self.reservations.lock().unwrap().push(reservation.clone());
            Box::pin(async move { Ok(reservation) })
        }

        fn remove(
            &self,
            _resource_id: ResourceId,
            _subject_id: SubjectId,
        ) -> BoxFuture<'_, Result<Option<Reservation>, StoreError>> {
            Box::pin(async { Ok(None) })
        }

        fn list(&self, _resource_id: ResourceId) -> BoxFuture<'_, Result<Vec<Reservation>, StoreError>> {
            let all = self.reservations.lock().unwrap().clone();
            Box::pin(async move { Ok(all) })
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap()
    }

    fn facade(capacity: u32) -> (Arc<Fixed>, ReservationQueries) {
        let resource = Resource::create(
            NewResource::new("Community meetup", capacity)
                .with_registration_deadline(t0() + Duration::hours(1)),
            t0(),
        )
        .unwrap();
        let backend = Arc::new(Fixed {
            resource,
            reservations: Mutex::new(Vec::new()),
        });
        let queries = ReservationQueries::new(backend.clone(), backend.clone());
        (backend, queries)
    }

    #[tokio::test]
    async fn availability_tracks_ledger_rows() {
        let (backend, queries) = facade(2);
        let id = backend.resource.id;

        let before = queries.availability(id, t0()).await.unwrap();
        assert_eq!(before.available_seats, 2);
        assert_eq!(before.status, RegistrationStatus::Open);

        ReservationLedger::insert(&*backend, Reservation::new(id, SubjectId::new(), t0()))
            .await
            .unwrap();
        ReservationLedger::insert(&*backend, Reservation::new(id, SubjectId::new(), t0()))
            .await
            .unwrap();

        assert_eq!(queries.available_seats(id).await.unwrap(), 0);
        assert_eq!(
            queries.registration_status(id, t0()).await.unwrap(),
            RegistrationStatus::Full
        );
    }

    #[tokio::test]
    async fn status_is_closed_at_deadline() {
        let (backend, queries) = facade(5);
        let status = queries
            .registration_status(backend.resource.id, t0() + Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(status, RegistrationStatus::Closed);
    }

    #[tokio::test]
    async fn unknown_resource_is_not_found() {
        let (_backend, queries) = facade(5);
        let missing = ResourceId::new();
        assert_eq!(
            queries.available_seats(missing).await,
            Err(RegistrationError::ResourceNotFound(missing))
        );
        assert_eq!(
            queries.reservations(missing).await,
            Err(RegistrationError::ResourceNotFound(missing))
        );
    }
}
