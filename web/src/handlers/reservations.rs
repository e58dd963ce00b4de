//! Reservation endpoints. Writes go through the reservation service so they
//! are serialized per resource; the list is a lock-free read.

use crate::WebResult;
use crate::extractors::{ResourcePath, Subject};
use crate::state::AppState;
use axum::{Json, extract::State, http::StatusCode};
use reservations_core::Reservation;

/// `GET /api/resources/:id/reservations`, oldest first.
///
/// # Errors
///
/// 404 if the resource does not exist, 503 if the backend fails.
pub async fn list_reservations(
    State(state): State<AppState>,
    ResourcePath(id): ResourcePath,
) -> WebResult<Json<Vec<Reservation>>> {
    Ok(Json(state.queries.reservations(id).await?))
}

/// `POST /api/resources/:id/reservations`: claim a seat for the caller.
///
/// # Errors
///
/// 401 without a subject, 404 for an unknown resource, 409 when closed, full
/// or already registered, 503 when busy or the backend fails.
pub async fn register(
    State(state): State<AppState>,
    ResourcePath(id): ResourcePath,
    Subject(subject_id): Subject,
) -> WebResult<(StatusCode, Json<Reservation>)> {
    let reservation = state
        .service
        .register(id, subject_id, state.clock.now())
        .await?;

    Ok((StatusCode::CREATED, Json(reservation)))
}

/// `DELETE /api/resources/:id/reservations`: give the caller's seat back.
///
/// # Errors
///
/// 401 without a subject, 404 for an unknown resource or no reservation,
/// 503 when busy or the backend fails.
pub async fn cancel_reservation(
    State(state): State<AppState>,
    ResourcePath(id): ResourcePath,
    Subject(subject_id): Subject,
) -> WebResult<Json<Reservation>> {
    Ok(Json(state.service.cancel(id, subject_id).await?))
}
