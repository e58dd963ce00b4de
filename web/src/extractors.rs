//! Custom Axum extractors.
//!
//! - [`Subject`]: the caller's identity from the trusted `X-Subject-Id` header
//! - [`ResourcePath`]: the `:id` path segment as a [`ResourceId`]
//! - [`JsonBody`]: a JSON request body
//! - [`CorrelationId`]: the request's correlation id
//!
//! Path and body rejections are turned into [`AppError`] so they leave as
//! the same JSON error body as every other failure.
//!
//! Identity is established upstream (a gateway or session layer). This
//! service only reads the subject id it is handed.

use crate::error::AppError;
use crate::middleware::correlation_from_headers;
use axum::{
    Json, async_trait,
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
};
use reservations_core::{ResourceId, SubjectId};
use serde::de::DeserializeOwned;
use uuid::Uuid;

/// Header carrying the authenticated subject id.
pub const SUBJECT_ID_HEADER: &str = "X-Subject-Id";

/// Authenticated subject making the request.
///
/// Rejects with `401` if the header is missing or is not a UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subject(pub SubjectId);

#[async_trait]
impl<S> FromRequestParts<S> for Subject
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(SUBJECT_ID_HEADER)
            .ok_or_else(|| AppError::unauthorized(format!("Missing {SUBJECT_ID_HEADER} header")))?;

        raw.to_str()
            .ok()
            .and_then(|s| s.parse::<SubjectId>().ok())
            .map(Self)
            .ok_or_else(|| AppError::unauthorized(format!("Malformed {SUBJECT_ID_HEADER} header")))
    }
}

/// Resource id taken from the `:id` path segment.
///
/// Rejects with `400 INVALID_PATH` if the segment is not a UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourcePath(pub ResourceId);

#[async_trait]
impl<S> FromRequestParts<S> for ResourcePath
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<ResourceId>::from_request_parts(parts, state).await?;
        Ok(Self(id))
    }
}

/// JSON request body.
///
/// Rejects with `422 VALIDATION_ERROR` if the body does not deserialize into
/// `T`, or `415` without a JSON content type.
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

/// Correlation ID for request tracing.
///
/// Set by [`correlation_id_layer`](crate::middleware::correlation_id_layer);
/// without the layer it is read from the header or freshly generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrelationId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(id) = parts.extensions.get::<Self>() {
            return Ok(*id);
        }

        Ok(Self(
            correlation_from_headers(&parts.headers).unwrap_or_else(Uuid::new_v4),
        ))
    }
}
