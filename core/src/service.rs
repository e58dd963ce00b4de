//! The reservation service contract.
//!
//! `register` is the only way a reservation comes into existence and `cancel`
//! the only way one goes away. Implementations must run each call as one
//! atomic unit that is serialized against every other `register`/`cancel`
//! on the **same** resource, and against nothing else:
//!
//! ```text
//! lock(resource) ─► get ─► deadline ─► exists ─► seats ─► insert ─► commit
//!      │             │        │          │          │        │
//!      ▼             ▼        ▼          ▼          ▼        ▼
//!    Busy     NotFound   Closed   AlreadyReg     Full   AlreadyReg (constraint)
//! ```
//!
//! Every failure is terminal for the call. Nothing is retried internally.

use crate::BoxFuture;
use crate::error::RegistrationError;
use crate::ids::{ResourceId, SubjectId};
use crate::reservation::Reservation;
use chrono::{DateTime, Utc};

/// Atomic, per-resource-serialized reservation commands.
pub trait ReservationService: Send + Sync {
    /// Claim one seat of `resource_id` for `subject_id`.
    ///
    /// # Errors
    ///
    /// - [`RegistrationError::Busy`] if the resource lock was not acquired in time
    /// - [`RegistrationError::ResourceNotFound`] if the resource does not exist
    /// - [`RegistrationError::RegistrationClosed`] if `now >= registration_deadline`
    /// - [`RegistrationError::AlreadyRegistered`] if the subject holds a seat,
    ///   whether or not any seat is left
    /// - [`RegistrationError::ResourceFull`] if no seat is left
    /// - [`RegistrationError::Unavailable`] on backend failure
    fn register(
        &self,
        resource_id: ResourceId,
        subject_id: SubjectId,
        now: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<Reservation, RegistrationError>>;

    /// Release the subject's seat and return the removed reservation.
    ///
    /// Allowed after the registration deadline.
    ///
    /// # Errors
    ///
    /// - [`RegistrationError::Busy`] if the resource lock was not acquired in time
    /// - [`RegistrationError::ResourceNotFound`] if the resource does not exist
    /// - [`RegistrationError::NotRegistered`] if the subject holds no seat
    /// - [`RegistrationError::Unavailable`] on backend failure
    fn cancel(
        &self,
        resource_id: ResourceId,
        subject_id: SubjectId,
    ) -> BoxFuture<'_, Result<Reservation, RegistrationError>>;
}
