//! In-process reservation service.
//!
//! [`LockingReservationService`] composes any [`ResourceStore`] and
//! [`ReservationLedger`] with a [`ResourceLocks`] table. Each `register` and
//! `cancel` holds the resource's lock from the first read to the final
//! write, which is what keeps `count <= capacity` when many tasks register
//! for the last seat at once.
//!
//! The ledger's uniqueness constraint is still the last line of defence for
//! double booking: a `Conflict` from `insert` becomes `AlreadyRegistered`
//! even if `exists` said otherwise.

use crate::locks::ResourceLocks;
use crate::metrics::ReservationMetrics;
use reservations_core::{
    BoxFuture, DateTime, RegistrationError, Reservation, ReservationLedger, ReservationService,
    ResourceId, ResourceStore, SubjectId, Utc,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Reservation service serialized by an in-process lock per resource.
pub struct LockingReservationService {
    store: Arc<dyn ResourceStore>,
    ledger: Arc<dyn ReservationLedger>,
    locks: ResourceLocks,
}

impl LockingReservationService {
    /// Create a service over `store` and `ledger` whose lock waits give up
    /// after `lock_timeout`.
    #[must_use]
    pub fn new(
        store: Arc<dyn ResourceStore>,
        ledger: Arc<dyn ReservationLedger>,
        lock_timeout: Duration,
    ) -> Self {
        Self {
            store,
            ledger,
            locks: ResourceLocks::new(lock_timeout),
        }
    }

    /// The lock table, for callers that must coordinate with this service.
    #[must_use]
    pub const fn locks(&self) -> &ResourceLocks {
        &self.locks
    }

    async fn register_locked(
        &self,
        resource_id: ResourceId,
        subject_id: SubjectId,
        now: DateTime<Utc>,
    ) -> Result<Reservation, RegistrationError> {
        let _guard = self.locks.acquire(resource_id).await?;

        let resource = self
            .store
            .get(resource_id)
            .await?
            .ok_or(RegistrationError::ResourceNotFound(resource_id))?;

        resource.ensure_open(now)?;

        // A subject holding a seat is told so even when the resource is full.
        if self.ledger.exists(resource_id, subject_id).await? {
            return Err(RegistrationError::AlreadyRegistered {
                resource_id,
                subject_id,
            });
        }

        let reserved = self.store.count_reservations(resource_id).await?;
        let available = resource.ensure_seat_available(reserved)?;

        let reservation = self
            .ledger
            .insert(Reservation::new(resource_id, subject_id, now))
            .await?;

        tracing::info!(
            resource_id = %resource_id,
            subject_id = %subject_id,
            reservation_id = %reservation.id,
            seats_left = available - 1,
            "Reservation committed"
        );

        Ok(reservation)
    }

    async fn cancel_locked(
        &self,
        resource_id: ResourceId,
        subject_id: SubjectId,
    ) -> Result<Reservation, RegistrationError> {
        let _guard = self.locks.acquire(resource_id).await?;

        if self.store.get(resource_id).await?.is_none() {
            return Err(RegistrationError::ResourceNotFound(resource_id));
        }

        let removed = self
            .ledger
            .remove(resource_id, subject_id)
            .await?
            .ok_or(RegistrationError::NotRegistered {
                resource_id,
                subject_id,
            })?;

        tracing::info!(
            resource_id = %resource_id,
            subject_id = %subject_id,
            reservation_id = %removed.id,
            "Reservation cancelled"
        );

        Ok(removed)
    }
}

/// Log a failed `register`/`cancel` at the level its class deserves.
///
/// `Unavailable` is an error, `Busy` a warning, business rejections debug.
pub fn log_rejection(
    operation: &'static str,
    resource_id: ResourceId,
    subject_id: SubjectId,
    err: &RegistrationError,
) {
    match err {
        RegistrationError::Unavailable(_) => tracing::error!(
            operation,
            resource_id = %resource_id,
            subject_id = %subject_id,
            error = %err,
            "Reservation backend failure"
        ),
        RegistrationError::Busy { .. } => tracing::warn!(
            operation,
            resource_id = %resource_id,
            subject_id = %subject_id,
            "Reservation rejected: resource busy"
        ),
        _ => tracing::debug!(
            operation,
            resource_id = %resource_id,
            subject_id = %subject_id,
            outcome = err.kind(),
            "Reservation rejected"
        ),
    }
}

impl ReservationService for LockingReservationService {
    fn register(
        &self,
        resource_id: ResourceId,
        subject_id: SubjectId,
        now: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<Reservation, RegistrationError>> {
        Box::pin(async move {
            let started = Instant::now();
            let result = self.register_locked(resource_id, subject_id, now).await;

            if let Err(err) = &result {
                log_rejection("register", resource_id, subject_id, err);
            }
            ReservationMetrics::record_register(&result, started.elapsed());
            result
        })
    }

    fn cancel(
        &self,
        resource_id: ResourceId,
        subject_id: SubjectId,
    ) -> BoxFuture<'_, Result<Reservation, RegistrationError>> {
        Box::pin(async move {
            let result = self.cancel_locked(resource_id, subject_id).await;

            if let Err(err) = &result {
                log_rejection("cancel", resource_id, subject_id, err);
            }
            ReservationMetrics::record_cancel(&result);
            result
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use reservations_core::ReservationQueries;
    use reservations_testing::{InMemoryBackend, fixtures, test_clock};
    use reservations_core::environment::Clock;

    fn service(backend: &Arc<InMemoryBackend>) -> LockingReservationService {
        LockingReservationService::new(
            backend.clone(),
            backend.clone(),
            Duration::from_millis(200),
        )
    }

    #[tokio::test]
    async fn last_seat_scenario() {
        let clock = test_clock();
        let backend = Arc::new(InMemoryBackend::new());
        let resource = backend.seed(fixtures::resource(1, None, clock.now()));
        let svc = service(&backend);
        let queries = ReservationQueries::new(backend.clone(), backend.clone());
        let (a, b) = (SubjectId::new(), SubjectId::new());

        let reservation = svc.register(resource.id, a, clock.now()).await.unwrap();
        assert_eq!(reservation.subject_id, a);
        assert_eq!(queries.available_seats(resource.id).await.unwrap(), 0);

        assert!(matches!(
            svc.register(resource.id, b, clock.now()).await,
            Err(RegistrationError::ResourceFull { capacity: 1, .. })
        ));

        assert_eq!(
            svc.register(resource.id, a, clock.now()).await,
            Err(RegistrationError::AlreadyRegistered {
                resource_id: resource.id,
                subject_id: a
            })
        );
    }

    #[tokio::test]
    async fn duplicate_with_seats_left_is_already_registered() {
        let clock = test_clock();
        let backend = Arc::new(InMemoryBackend::new());
        let resource = backend.seed(fixtures::resource(5, None, clock.now()));
        let svc = service(&backend);
        let a = SubjectId::new();

        svc.register(resource.id, a, clock.now()).await.unwrap();
        assert_eq!(
            svc.register(resource.id, a, clock.now()).await,
            Err(RegistrationError::AlreadyRegistered {
                resource_id: resource.id,
                subject_id: a
            })
        );
        assert_eq!(backend.reservation_count(resource.id), 1);
    }

    #[tokio::test]
    async fn deadline_boundary() {
        let clock = test_clock();
        let deadline = clock.now() + ChronoDuration::hours(1);
        let backend = Arc::new(InMemoryBackend::new());
        let resource = backend.seed(fixtures::resource(1, Some(deadline), clock.now()));
        let svc = service(&backend);

        assert!(matches!(
            svc.register(resource.id, SubjectId::new(), deadline).await,
            Err(RegistrationError::RegistrationClosed { .. })
        ));

        let just_before = deadline - ChronoDuration::seconds(1);
        assert!(svc.register(resource.id, SubjectId::new(), just_before).await.is_ok());

        // Past the deadline Closed wins even though the resource is now full.
        assert!(matches!(
            svc.register(resource.id, SubjectId::new(), deadline).await,
            Err(RegistrationError::RegistrationClosed { .. })
        ));
    }

    #[tokio::test]
    async fn unknown_resource_is_not_found() {
        let backend = Arc::new(InMemoryBackend::new());
        let svc = service(&backend);
        let missing = ResourceId::new();

        assert_eq!(
            svc.register(missing, SubjectId::new(), test_clock().now()).await,
            Err(RegistrationError::ResourceNotFound(missing))
        );
    }

    #[tokio::test]
    async fn ledger_constraint_backs_up_the_exists_check() {
        let clock = test_clock();
        let backend = Arc::new(InMemoryBackend::new());
        let resource = backend.seed(fixtures::resource(5, None, clock.now()));
        let svc = service(&backend);
        let a = SubjectId::new();

        backend.hide_existing_reservations(true);
        svc.register(resource.id, a, clock.now()).await.unwrap();

        assert!(matches!(
            svc.register(resource.id, a, clock.now()).await,
            Err(RegistrationError::AlreadyRegistered { .. })
        ));
        assert_eq!(backend.reservation_count(resource.id), 1);
    }

    #[tokio::test]
    async fn failed_insert_leaves_nothing_behind() {
        let clock = test_clock();
        let backend = Arc::new(InMemoryBackend::new());
        let resource = backend.seed(fixtures::resource(5, None, clock.now()));
        let svc = service(&backend);

        backend.fail_next_insert();
        let err = svc
            .register(resource.id, SubjectId::new(), clock.now())
            .await
            .unwrap_err();

        assert!(err.is_unavailable());
        assert_eq!(backend.reservation_count(resource.id), 0);
    }

    #[tokio::test]
    async fn busy_when_lock_is_held() {
        let clock = test_clock();
        let backend = Arc::new(InMemoryBackend::new());
        let resource = backend.seed(fixtures::resource(5, None, clock.now()));
        let svc = LockingReservationService::new(
            backend.clone(),
            backend.clone(),
            Duration::from_millis(20),
        );

        let _held = svc.locks().acquire(resource.id).await.unwrap();
        let err = svc
            .register(resource.id, SubjectId::new(), clock.now())
            .await
            .unwrap_err();

        assert!(err.is_retryable());
        assert_eq!(backend.reservation_count(resource.id), 0);
    }

    #[tokio::test]
    async fn cancel_frees_the_seat() {
        let clock = test_clock();
        let backend = Arc::new(InMemoryBackend::new());
        let resource = backend.seed(fixtures::resource(1, None, clock.now()));
        let svc = service(&backend);
        let (a, b) = (SubjectId::new(), SubjectId::new());

        let reservation = svc.register(resource.id, a, clock.now()).await.unwrap();
        assert_eq!(svc.cancel(resource.id, a).await.unwrap(), reservation);

        assert!(svc.register(resource.id, b, clock.now()).await.is_ok());
    }

    #[tokio::test]
    async fn cancel_is_allowed_after_deadline() {
        let clock = test_clock();
        let deadline = clock.now() + ChronoDuration::minutes(5);
        let backend = Arc::new(InMemoryBackend::new());
        let resource = backend.seed(fixtures::resource(2, Some(deadline), clock.now()));
        let svc = service(&backend);
        let a = SubjectId::new();

        svc.register(resource.id, a, clock.now()).await.unwrap();
        clock.advance(ChronoDuration::hours(1));

        assert!(svc.cancel(resource.id, a).await.is_ok());
        assert_eq!(backend.reservation_count(resource.id), 0);
    }

    #[tokio::test]
    async fn cancel_without_reservation_is_not_registered() {
        let clock = test_clock();
        let backend = Arc::new(InMemoryBackend::new());
        let resource = backend.seed(fixtures::resource(2, None, clock.now()));
        let svc = service(&backend);
        let a = SubjectId::new();

        assert_eq!(
            svc.cancel(resource.id, a).await,
            Err(RegistrationError::NotRegistered {
                resource_id: resource.id,
                subject_id: a
            })
        );

        let missing = ResourceId::new();
        assert_eq!(
            svc.cancel(missing, a).await,
            Err(RegistrationError::ResourceNotFound(missing))
        );
    }
}
