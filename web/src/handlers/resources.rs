//! Resource endpoints: creation and read views.

use crate::WebResult;
use crate::extractors::{JsonBody, ResourcePath};
use crate::state::AppState;
use axum::{Json, extract::State, http::StatusCode};
use reservations_core::{Availability, NewResource, Resource};
use serde::Serialize;

/// A resource together with its availability at the time of the request.
#[derive(Debug, Serialize)]
pub struct ResourceView {
    /// The resource.
    #[serde(flatten)]
    pub resource: Resource,
    /// Seats and status derived from the ledger.
    pub availability: Availability,
}

/// `POST /api/resources`
///
/// # Errors
///
/// 422 on an invalid request, 409 on an id collision, 503 if the backend fails.
pub async fn create_resource(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<NewResource>,
) -> WebResult<(StatusCode, Json<Resource>)> {
    let resource = Resource::create(request, state.clock.now())?;
    state.resources.insert(resource.clone()).await?;

    Ok((StatusCode::CREATED, Json(resource)))
}

/// `GET /api/resources/:id`
///
/// # Errors
///
/// 404 if the resource does not exist, 503 if the backend fails.
pub async fn get_resource(
    State(state): State<AppState>,
    ResourcePath(id): ResourcePath,
) -> WebResult<Json<ResourceView>> {
    let resource = state.queries.resource(id).await?;
    let availability = state.queries.availability(id, state.clock.now()).await?;

    Ok(Json(ResourceView {
        resource,
        availability,
    }))
}

/// `GET /api/resources/:id/availability`
///
/// # Errors
///
/// 404 if the resource does not exist, 503 if the backend fails.
pub async fn get_availability(
    State(state): State<AppState>,
    ResourcePath(id): ResourcePath,
) -> WebResult<Json<Availability>> {
    Ok(Json(
        state.queries.availability(id, state.clock.now()).await?,
    ))
}
