//! Capacity-bounded resources and the admission rules that guard them.
//!
//! A resource never stores its registration count or status. Both are derived
//! from the number of reservations in the ledger at the moment of asking, so
//! there is no counter that can drift out of sync with the ledger.

use crate::error::RegistrationError;
use crate::ids::ResourceId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Derived registration state of a resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    /// Deadline not reached and at least one seat left.
    Open,
    /// Deadline not reached but no seats left.
    Full,
    /// Deadline reached. Takes precedence over `Full`.
    Closed,
}

impl RegistrationStatus {
    /// Lowercase name as exposed over the API.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Full => "full",
            Self::Closed => "closed",
        }
    }
}

/// Validation failures when creating a resource.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResourceValidationError {
    /// Title is empty or whitespace.
    #[error("Resource title must not be empty")]
    EmptyTitle,

    /// Registration would stay open after the resource starts.
    #[error("Registration deadline {deadline} must not be after start time {starts_at}")]
    DeadlineAfterStart {
        /// Requested deadline.
        deadline: DateTime<Utc>,
        /// Requested start time.
        starts_at: DateTime<Utc>,
    },
}

/// Request to create a resource.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewResource {
    /// Display title.
    pub title: String,
    /// Number of seats.
    pub capacity: u32,
    /// When the resource takes place, if scheduled.
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    /// No reservations are accepted at or after this instant.
    #[serde(default)]
    pub registration_deadline: Option<DateTime<Utc>>,
}

impl NewResource {
    /// New unscheduled resource without a deadline.
    #[must_use]
    pub fn new(title: impl Into<String>, capacity: u32) -> Self {
        Self {
            title: title.into(),
            capacity,
            starts_at: None,
            registration_deadline: None,
        }
    }

    /// Set the start time.
    #[must_use]
    pub fn with_starts_at(mut self, starts_at: DateTime<Utc>) -> Self {
        self.starts_at = Some(starts_at);
        self
    }

    /// Set the registration deadline.
    #[must_use]
    pub fn with_registration_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.registration_deadline = Some(deadline);
        self
    }
}

/// A capacity-bounded entity that subjects reserve seats on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Identifier.
    pub id: ResourceId,
    /// Display title.
    pub title: String,
    /// Number of seats. Fixed at creation.
    pub capacity: u32,
    /// When the resource takes place, if scheduled.
    pub starts_at: Option<DateTime<Utc>>,
    /// No reservations are accepted at or after this instant.
    pub registration_deadline: Option<DateTime<Utc>>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl Resource {
    /// Validate a creation request and build the resource.
    ///
    /// # Errors
    ///
    /// - [`ResourceValidationError::EmptyTitle`] if the title is blank
    /// - [`ResourceValidationError::DeadlineAfterStart`] if the deadline is
    ///   later than the start time
    pub fn create(
        request: NewResource,
        now: DateTime<Utc>,
    ) -> Result<Self, ResourceValidationError> {
        let title = request.title.trim();
        if title.is_empty() {
            return Err(ResourceValidationError::EmptyTitle);
        }

        if let (Some(deadline), Some(starts_at)) =
            (request.registration_deadline, request.starts_at)
        {
            if deadline > starts_at {
                return Err(ResourceValidationError::DeadlineAfterStart {
                    deadline,
                    starts_at,
                });
            }
        }

        Ok(Self {
            id: ResourceId::new(),
            title: title.to_string(),
            capacity: request.capacity,
            starts_at: request.starts_at,
            registration_deadline: request.registration_deadline,
            created_at: now,
        })
    }

    /// Whether the deadline has been reached at `now`. The deadline itself
    /// is already closed.
    #[must_use]
    pub fn is_closed_at(&self, now: DateTime<Utc>) -> bool {
        self.registration_deadline
            .is_some_and(|deadline| now >= deadline)
    }

    /// Seats left given `reserved` committed reservations.
    ///
    /// Saturates at zero if capacity was lowered below the current count.
    #[must_use]
    pub const fn available_seats(&self, reserved: u32) -> u32 {
        self.capacity.saturating_sub(reserved)
    }

    /// Derived status: `Closed` beats `Full` beats `Open`.
    #[must_use]
    pub fn status_at(&self, now: DateTime<Utc>, reserved: u32) -> RegistrationStatus {
        if self.is_closed_at(now) {
            RegistrationStatus::Closed
        } else if self.available_seats(reserved) == 0 {
            RegistrationStatus::Full
        } else {
            RegistrationStatus::Open
        }
    }

    /// Deadline check of a registration attempt.
    ///
    /// # Errors
    ///
    /// [`RegistrationError::RegistrationClosed`] if `now >= registration_deadline`.
    pub fn ensure_open(&self, now: DateTime<Utc>) -> Result<(), RegistrationError> {
        match self.registration_deadline {
            Some(deadline) if now >= deadline => Err(RegistrationError::RegistrationClosed {
                resource_id: self.id,
                deadline,
            }),
            _ => Ok(()),
        }
    }

    /// Capacity check of a registration attempt.
    ///
    /// Returns the seats left *before* the new reservation is inserted.
    ///
    /// # Errors
    ///
    /// [`RegistrationError::ResourceFull`] if no seat is left.
    pub fn ensure_seat_available(&self, reserved: u32) -> Result<u32, RegistrationError> {
        let available = self.available_seats(reserved);
        if available == 0 {
            return Err(RegistrationError::ResourceFull {
                resource_id: self.id,
                capacity: self.capacity,
            });
        }
        Ok(available)
    }
}
