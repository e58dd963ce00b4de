//! Pool-backed resource store and reservation ledger.

use crate::rows;
use reservations_core::{
    BoxFuture, Reservation, ReservationLedger, Resource, ResourceId, ResourceStore, StoreError,
    SubjectId,
};
use sqlx::PgPool;
use sqlx::pool::PoolConnection;
use sqlx::postgres::Postgres;

/// `PostgreSQL` implementation of [`ResourceStore`] and [`ReservationLedger`].
///
/// Each call runs on its own pooled connection without an explicit
/// transaction. Atomic `register`/`cancel` is the job of
/// [`PostgresReservationService`](crate::PostgresReservationService).
#[derive(Clone, Debug)]
pub struct PostgresReservationStore {
    pool: PgPool,
}

impl PostgresReservationStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn conn(&self) -> Result<PoolConnection<Postgres>, StoreError> {
        self.pool.acquire().await.map_err(store_error)
    }
}

fn store_error(e: sqlx::Error) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

impl ResourceStore for PostgresReservationStore {
    fn get(&self, id: ResourceId) -> BoxFuture<'_, Result<Option<Resource>, StoreError>> {
        Box::pin(async move {
            let mut conn = self.conn().await?;
            rows::fetch_resource(&mut conn, id, false)
                .await
                .map_err(store_error)
        })
    }

    fn insert(&self, resource: Resource) -> BoxFuture<'_, Result<(), StoreError>> {
        Box::pin(async move {
            let mut conn = self.conn().await?;
            rows::insert_resource(&mut conn, &resource)
                .await
                .map_err(|e| {
                    if is_unique_violation(&e) {
                        StoreError::ResourceExists(resource.id)
                    } else {
                        store_error(e)
                    }
                })?;

            tracing::info!(resource_id = %resource.id, capacity = resource.capacity, "Resource created");
            Ok(())
        })
    }

    fn count_reservations(&self, id: ResourceId) -> BoxFuture<'_, Result<u32, StoreError>> {
        Box::pin(async move {
            let mut conn = self.conn().await?;
            rows::count_reservations(&mut conn, id)
                .await
                .map_err(store_error)
        })
    }

    fn ping(&self) -> BoxFuture<'_, Result<(), StoreError>> {
        Box::pin(async move {
            sqlx::query("SELECT 1")
                .execute(&self.pool)
                .await
                .map_err(store_error)?;
            Ok(())
        })
    }
}

impl ReservationLedger for PostgresReservationStore {
    fn exists(
        &self,
        resource_id: ResourceId,
        subject_id: SubjectId,
    ) -> BoxFuture<'_, Result<bool, StoreError>> {
        Box::pin(async move {
            let mut conn = self.conn().await?;
            rows::reservation_exists(&mut conn, resource_id, subject_id)
                .await
                .map_err(store_error)
        })
    }

    fn insert(&self, reservation: Reservation) -> BoxFuture<'_, Result<Reservation, StoreError>> {
        Box::pin(async move {
            let mut conn = self.conn().await?;
            match rows::insert_reservation(&mut conn, &reservation).await {
                Ok(()) => Ok(reservation),
                Err(e) if is_unique_violation(&e) => Err(StoreError::Conflict {
                    resource_id: reservation.resource_id,
                    subject_id: reservation.subject_id,
                }),
                Err(e) => Err(store_error(e)),
            }
        })
    }

    fn remove(
        &self,
        resource_id: ResourceId,
        subject_id: SubjectId,
    ) -> BoxFuture<'_, Result<Option<Reservation>, StoreError>> {
        Box::pin(async move {
            let mut conn = self.conn().await?;
            rows::delete_reservation(&mut conn, resource_id, subject_id)
                .await
                .map_err(store_error)
        })
    }

    fn list(&self, resource_id: ResourceId) -> BoxFuture<'_, Result<Vec<Reservation>, StoreError>> {
        Box::pin(async move {
            let mut conn = self.conn().await?;
            rows::list_reservations(&mut conn, resource_id)
                .await
                .map_err(store_error)
        })
    }
}
