//! Error taxonomy for reservation operations.
//!
//! [`RegistrationError`] is what callers of `register`/`cancel` and of the
//! query facade see. The first variants are *expected* outcomes of a
//! registration attempt and are returned as values; [`RegistrationError::Unavailable`]
//! is the separate class for infrastructure failures (lost connection,
//! corrupt row) and is never used for a business rule.
//!
//! [`StoreError`] is what store and ledger implementations return.

use crate::ids::{ResourceId, SubjectId};
use chrono::{DateTime, Utc};
use std::time::Duration;
use thiserror::Error;

/// Outcome of a failed `register`, `cancel` or query call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// The resource does not exist.
    #[error("Resource not found: {0}")]
    ResourceNotFound(ResourceId),

    /// The registration deadline has been reached.
    #[error("Registration for {resource_id} closed at {deadline}")]
    RegistrationClosed {
        /// The resource that was closed.
        resource_id: ResourceId,
        /// The deadline that was reached (exclusive of success).
        deadline: DateTime<Utc>,
    },

    /// Every seat is taken.
    #[error("Resource {resource_id} is full ({capacity} seats)")]
    ResourceFull {
        /// The full resource.
        resource_id: ResourceId,
        /// Its capacity.
        capacity: u32,
    },

    /// The subject already holds a reservation for this resource.
    #[error("Subject {subject_id} is already registered for {resource_id}")]
    AlreadyRegistered {
        /// The resource.
        resource_id: ResourceId,
        /// The subject holding the existing reservation.
        subject_id: SubjectId,
    },

    /// The subject holds no reservation to cancel.
    #[error("Subject {subject_id} is not registered for {resource_id}")]
    NotRegistered {
        /// The resource.
        resource_id: ResourceId,
        /// The subject without a reservation.
        subject_id: SubjectId,
    },

    /// The per-resource lock could not be acquired within the bounded wait.
    ///
    /// Transient. Callers may retry with backoff.
    #[error("Resource {resource_id} is busy (lock not acquired within {timeout:?})")]
    Busy {
        /// The contended resource.
        resource_id: ResourceId,
        /// How long the call waited before giving up.
        timeout: Duration,
    },

    /// Persistence failure unrelated to the reservation rules.
    #[error("Reservation backend unavailable: {0}")]
    Unavailable(String),
}

impl RegistrationError {
    /// Stable snake_case label for metrics and structured logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ResourceNotFound(_) => "resource_not_found",
            Self::RegistrationClosed { .. } => "registration_closed",
            Self::ResourceFull { .. } => "resource_full",
            Self::AlreadyRegistered { .. } => "already_registered",
            Self::NotRegistered { .. } => "not_registered",
            Self::Busy { .. } => "busy",
            Self::Unavailable(_) => "unavailable",
        }
    }

    /// Whether retrying the same call can succeed without anything else
    /// changing. Only lock contention qualifies.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Busy { .. })
    }

    /// Whether this is an infrastructure failure rather than a rule outcome.
    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Errors returned by [`ResourceStore`](crate::store::ResourceStore) and
/// [`ReservationLedger`](crate::store::ReservationLedger) implementations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The `(resource, subject)` uniqueness constraint rejected an insert.
    #[error("Reservation for subject {subject_id} on {resource_id} already exists")]
    Conflict {
        /// The resource.
        resource_id: ResourceId,
        /// The subject.
        subject_id: SubjectId,
    },

    /// A resource with this id already exists.
    #[error("Resource already exists: {0}")]
    ResourceExists(ResourceId),

    /// Storage backend failure (connection, query, decoding).
    #[error("Storage error: {0}")]
    Unavailable(String),
}

impl From<StoreError> for RegistrationError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict {
                resource_id,
                subject_id,
            } => Self::AlreadyRegistered {
                resource_id,
                subject_id,
            },
            other @ (StoreError::ResourceExists(_) | StoreError::Unavailable(_)) => {
                Self::Unavailable(other.to_string())
            }
        }
    }
}
