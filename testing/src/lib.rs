//! # Reservations Testing
//!
//! Testing utilities for the reservation crates.
//!
//! This crate provides:
//! - [`InMemoryBackend`]: store and ledger in one, with fault injection
//! - [`FixedClock`]: deterministic, manually advanced time
//! - [`fixtures`]: ready-made resources
//! - [`properties`]: proptest strategies for operation sequences
//!
//! ## Example
//!
//! ```
//! use reservations_core::environment::Clock;
//! use reservations_testing::{InMemoryBackend, fixtures, test_clock};
//!
//! let clock = test_clock();
//! let backend = InMemoryBackend::new();
//! let resource = backend.seed(fixtures::resource(1, None, clock.now()));
//! assert_eq!(backend.reservation_count(resource.id), 0);
//! ```

use chrono::{DateTime, Utc};
use reservations_core::environment::Clock;

pub mod backend;

pub use backend::InMemoryBackend;

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use std::sync::{Arc, PoisonError, RwLock};

    /// Fixed clock for deterministic tests
    ///
    /// Returns the same time until [`advance`](Self::advance) or
    /// [`set`](Self::set) moves it. Clones share the same time.
    ///
    /// # Example
    ///
    /// ```
    /// use reservations_testing::mocks::FixedClock;
    /// use reservations_core::environment::Clock;
    /// use chrono::{Duration, Utc};
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// assert_eq!(clock.now(), time1);
    ///
    /// clock.advance(Duration::seconds(30));
    /// assert_eq!(clock.now(), time1 + Duration::seconds(30));
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: Arc<RwLock<DateTime<Utc>>>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub fn new(time: DateTime<Utc>) -> Self {
            Self {
                time: Arc::new(RwLock::new(time)),
            }
        }

        /// Move the clock forward (or backward, with a negative duration).
        pub fn advance(&self, by: chrono::Duration) {
            let mut time = self.time.write().unwrap_or_else(PoisonError::into_inner);
            *time += by;
        }

        /// Jump to an absolute time.
        pub fn set(&self, to: DateTime<Utc>) {
            *self.time.write().unwrap_or_else(PoisonError::into_inner) = to;
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            *self.time.read().unwrap_or_else(PoisonError::into_inner)
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Ready-made domain values.
pub mod fixtures {
    use chrono::{DateTime, Utc};
    use reservations_core::{NewResource, Resource};

    /// A resource with the given capacity and optional deadline, created at `now`.
    ///
    /// # Panics
    ///
    /// Never for the fixed title used here.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn resource(capacity: u32, deadline: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Resource {
        Resource::create(new_resource(capacity, deadline), now)
            .expect("fixture resource should always validate")
    }

    /// A creation request without a start time.
    #[must_use]
    pub fn new_resource(capacity: u32, deadline: Option<DateTime<Utc>>) -> NewResource {
        let mut request = NewResource::new("Weekly support group", capacity);
        request.registration_deadline = deadline;
        request
    }
}

/// Property-based testing utilities using proptest.
pub mod properties {
    use proptest::prelude::*;

    /// One step of a generated workload against a single resource.
    ///
    /// Subjects are indexes into a fixed pool so that repeats (duplicates,
    /// cancels of held seats) actually occur.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Operation {
        /// `register` for subject `n`
        Register(usize),
        /// `cancel` for subject `n`
        Cancel(usize),
    }

    /// Operations over a pool of `subjects` subjects, registers twice as likely.
    pub fn operation(subjects: usize) -> impl Strategy<Value = Operation> {
        prop_oneof![
            2 => (0..subjects).prop_map(Operation::Register),
            1 => (0..subjects).prop_map(Operation::Cancel),
        ]
    }

    /// Up to `max_len` operations over a pool of `subjects` subjects.
    pub fn operations(subjects: usize, max_len: usize) -> impl Strategy<Value = Vec<Operation>> {
        proptest::collection::vec(operation(subjects), 0..max_len)
    }
}

// Re-export commonly used items
pub use mocks::{FixedClock, test_clock};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        let time1 = clock.now();
        let time2 = clock.now();
        assert_eq!(time1, time2);
    }

    #[test]
    fn clones_share_advances() {
        let clock = test_clock();
        let shared = clock.clone();
        clock.advance(chrono::Duration::hours(2));
        assert_eq!(shared.now(), clock.now());
    }

    #[test]
    fn fixture_carries_deadline() {
        let clock = test_clock();
        let deadline = clock.now() + chrono::Duration::days(1);
        let resource = fixtures::resource(4, Some(deadline), clock.now());
        assert_eq!(resource.capacity, 4);
        assert_eq!(resource.registration_deadline, Some(deadline));
    }
}
