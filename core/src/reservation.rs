//! Reservations: committed claims on one seat of a resource.

use crate::ids::{ReservationId, ResourceId, SubjectId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A committed claim on one unit of a resource's capacity.
///
/// Created only by `register`, never updated, removed only by `cancel`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    /// Identifier.
    pub id: ReservationId,
    /// The reserved resource.
    pub resource_id: ResourceId,
    /// Who holds the seat.
    pub subject_id: SubjectId,
    /// Set once when the reservation is created.
    pub created_at: DateTime<Utc>,
}

impl Reservation {
    /// New reservation with a fresh id.
    #[must_use]
    pub fn new(resource_id: ResourceId, subject_id: SubjectId, created_at: DateTime<Utc>) -> Self {
        Self {
            id: ReservationId::new(),
            resource_id,
            subject_id,
            created_at,
        }
    }
}
