//! # Reservations Core
//!
//! Domain types and contracts for capacity-bounded reservations.
//!
//! A **resource** (a community event, a workshop, a group session) has a fixed
//! capacity and an optional registration deadline. A **subject** (an external
//! user identity) claims one unit of that capacity by holding a
//! **reservation**. This crate owns the rules; the runtime and postgres crates
//! own the locking that makes the rules hold under concurrent writers.
//!
//! ## Core Concepts
//!
//! - **Resource Store**: owns resources and counts their reservations
//! - **Reservation Ledger**: owns reservations, one per `(resource, subject)`
//! - **Reservation Service**: runs `register`/`cancel` atomically per resource
//! - **Query Facade**: lock-free read views (available seats, status)
//!
//! ## Invariants
//!
//! - `count(reservations for r) <= r.capacity`, always
//! - at most one reservation per `(resource, subject)` pair
//! - a failed `register` leaves zero reservations behind
//!
//! ## Example
//!
//! ```
//! use chrono::{Duration, TimeZone, Utc};
//! use reservations_core::resource::{NewResource, RegistrationStatus, Resource};
//!
//! let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
//! let resource = Resource::create(
//!     NewResource::new("Grief support circle", 1)
//!         .with_registration_deadline(now + Duration::hours(1)),
//!     now,
//! )
//! .unwrap();
//!
//! assert_eq!(resource.status_at(now, 0), RegistrationStatus::Open);
//! assert_eq!(resource.status_at(now, 1), RegistrationStatus::Full);
//! assert_eq!(
//!     resource.status_at(now + Duration::hours(1), 0),
//!     RegistrationStatus::Closed
//! );
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};

pub mod engagement;
pub mod error;
pub mod ids;
pub mod query;
pub mod reservation;
pub mod resource;
pub mod service;
pub mod store;

pub use engagement::EngagementCounts;
pub use error::{RegistrationError, StoreError};
pub use ids::{ParseIdError, ReservationId, ResourceId, SubjectId};
pub use query::{Availability, ReservationQueries};
pub use reservation::Reservation;
pub use resource::{NewResource, RegistrationStatus, Resource, ResourceValidationError};
pub use service::ReservationService;
pub use store::{ReservationLedger, ResourceStore};

/// Boxed, `Send` future returned by the dyn-compatible traits in this crate.
///
/// The store, ledger and service traits return this instead of using
/// `async fn` so they can be held as `Arc<dyn Trait>` by the web layer.
pub type BoxFuture<'a, T> =
    std::pin::Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// Environment module - injected dependencies.
///
/// Time is the only ambient dependency of the reservation rules. The service
/// takes `now` as an argument; callers obtain it from a [`Clock`].
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// # Examples
    ///
    /// ```
    /// use reservations_core::environment::{Clock, SystemClock};
    ///
    /// let clock = SystemClock;
    /// let before = clock.now();
    /// assert!(clock.now() >= before);
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall-clock time from the operating system.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}
