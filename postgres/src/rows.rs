//! SQL shared by the store and the transactional service.
//!
//! Every helper takes a `&mut PgConnection` so it runs unchanged on a pooled
//! connection or inside a transaction (`&mut *tx`).

use reservations_core::{Reservation, Resource, ResourceId, SubjectId};
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, Row};

const RESOURCE_COLUMNS: &str =
    "id, title, capacity, starts_at, registration_deadline, created_at";
const RESERVATION_COLUMNS: &str = "id, resource_id, subject_id, created_at";

/// Row decoding failed, or a stored value is out of range for the domain type.
#[derive(Debug)]
pub(crate) struct DecodeError(pub(crate) String);

impl From<sqlx::Error> for DecodeError {
    fn from(e: sqlx::Error) -> Self {
        Self(e.to_string())
    }
}

fn resource_from_row(row: &PgRow) -> Result<Resource, DecodeError> {
    let capacity: i64 = row.try_get("capacity")?;
    let capacity = u32::try_from(capacity)
        .map_err(|_| DecodeError(format!("capacity {capacity} out of range")))?;

    Ok(Resource {
        id: row.try_get::<uuid::Uuid, _>("id")?.into(),
        title: row.try_get("title")?,
        capacity,
        starts_at: row.try_get("starts_at")?,
        registration_deadline: row.try_get("registration_deadline")?,
        created_at: row.try_get("created_at")?,
    })
}

fn reservation_from_row(row: &PgRow) -> Result<Reservation, DecodeError> {
    Ok(Reservation {
        id: row.try_get::<uuid::Uuid, _>("id")?.into(),
        resource_id: row.try_get::<uuid::Uuid, _>("resource_id")?.into(),
        subject_id: row.try_get::<uuid::Uuid, _>("subject_id")?.into(),
        created_at: row.try_get("created_at")?,
    })
}

pub(crate) async fn fetch_resource(
    conn: &mut PgConnection,
    id: ResourceId,
    for_update: bool,
) -> Result<Option<Resource>, sqlx::Error> {
    let lock = if for_update { " FOR UPDATE" } else { "" };
    let sql = format!("SELECT {RESOURCE_COLUMNS} FROM resources WHERE id = $1{lock}");

    let row = sqlx::query(&sql)
        .bind(id.as_uuid())
        .fetch_optional(conn)
        .await?;

    row.as_ref()
        .map(resource_from_row)
        .transpose()
        .map_err(|e| sqlx::Error::Decode(e.0.into()))
}

pub(crate) async fn insert_resource(
    conn: &mut PgConnection,
    resource: &Resource,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r"
        INSERT INTO resources (id, title, capacity, starts_at, registration_deadline, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        ",
    )
    .bind(resource.id.as_uuid())
    .bind(&resource.title)
    .bind(i64::from(resource.capacity))
    .bind(resource.starts_at)
    .bind(resource.registration_deadline)
    .bind(resource.created_at)
    .execute(conn)
    .await?;
    Ok(())
}

pub(crate) async fn count_reservations(
    conn: &mut PgConnection,
    resource_id: ResourceId,
) -> Result<u32, sqlx::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reservations WHERE resource_id = $1")
        .bind(resource_id.as_uuid())
        .fetch_one(conn)
        .await?;

    u32::try_from(count).map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

pub(crate) async fn reservation_exists(
    conn: &mut PgConnection,
    resource_id: ResourceId,
    subject_id: SubjectId,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM reservations WHERE resource_id = $1 AND subject_id = $2)",
    )
    .bind(resource_id.as_uuid())
    .bind(subject_id.as_uuid())
    .fetch_one(conn)
    .await
}

pub(crate) async fn insert_reservation(
    conn: &mut PgConnection,
    reservation: &Reservation,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r"
        INSERT INTO reservations (id, resource_id, subject_id, created_at)
        VALUES ($1, $2, $3, $4)
        ",
    )
    .bind(reservation.id.as_uuid())
    .bind(reservation.resource_id.as_uuid())
    .bind(reservation.subject_id.as_uuid())
    .bind(reservation.created_at)
    .execute(conn)
    .await?;
    Ok(())
}

pub(crate) async fn delete_reservation(
    conn: &mut PgConnection,
    resource_id: ResourceId,
    subject_id: SubjectId,
) -> Result<Option<Reservation>, sqlx::Error> {
    let sql = format!(
        "DELETE FROM reservations WHERE resource_id = $1 AND subject_id = $2 \
         RETURNING {RESERVATION_COLUMNS}"
    );
    let row = sqlx::query(&sql)
        .bind(resource_id.as_uuid())
        .bind(subject_id.as_uuid())
        .fetch_optional(conn)
        .await?;

    row.as_ref()
        .map(reservation_from_row)
        .transpose()
        .map_err(|e| sqlx::Error::Decode(e.0.into()))
}

pub(crate) async fn list_reservations(
    conn: &mut PgConnection,
    resource_id: ResourceId,
) -> Result<Vec<Reservation>, sqlx::Error> {
    let sql = format!(
        "SELECT {RESERVATION_COLUMNS} FROM reservations WHERE resource_id = $1 \
         ORDER BY created_at, id"
    );
    let rows = sqlx::query(&sql)
        .bind(resource_id.as_uuid())
        .fetch_all(conn)
        .await?;

    rows.iter()
        .map(reservation_from_row)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| sqlx::Error::Decode(e.0.into()))
}
