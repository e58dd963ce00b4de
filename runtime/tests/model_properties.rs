//! Property tests: the service agrees with a trivial sequential model
//!
//! For any sequence of register/cancel calls against one resource, each
//! outcome must be what a set with a size limit would answer, and the ledger
//! must never hold more reservations than the capacity.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use proptest::prelude::*;
use reservations_core::environment::Clock;
use reservations_core::{RegistrationError, ReservationService, SubjectId};
use reservations_runtime::LockingReservationService;
use reservations_testing::properties::{Operation, operations};
use reservations_testing::{InMemoryBackend, fixtures, test_clock};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

const SUBJECTS: usize = 6;

fn run(capacity: u32, ops: &[Operation]) -> Result<(), TestCaseError> {
    tokio_test::block_on(async {
        let clock = test_clock();
        let backend = Arc::new(InMemoryBackend::new());
        let resource = backend.seed(fixtures::resource(capacity, None, clock.now()));
        let svc = LockingReservationService::new(
            backend.clone(),
            backend.clone(),
            Duration::from_secs(1),
        );
        let subjects: Vec<SubjectId> = (0..SUBJECTS).map(|_| SubjectId::new()).collect();
        let mut model: HashSet<usize> = HashSet::new();

        for op in ops {
            match *op {
                Operation::Register(n) => {
                    let result = svc.register(resource.id, subjects[n], clock.now()).await;
                    if model.contains(&n) {
                        let is_duplicate =
                            matches!(result, Err(RegistrationError::AlreadyRegistered { .. }));
                        prop_assert!(is_duplicate, "expected duplicate, got {:?}", result);
                    } else if model.len() >= capacity as usize {
                        let is_full = matches!(result, Err(RegistrationError::ResourceFull { .. }));
                        prop_assert!(is_full, "expected full, got {:?}", result);
                    } else {
                        prop_assert!(result.is_ok(), "expected success, got {:?}", result);
                        model.insert(n);
                    }
                }
                Operation::Cancel(n) => {
                    let result = svc.cancel(resource.id, subjects[n]).await;
                    if model.remove(&n) {
                        prop_assert!(result.is_ok());
                    } else {
                        let not_registered =
                            matches!(result, Err(RegistrationError::NotRegistered { .. }));
                        prop_assert!(not_registered);
                    }
                }
            }

            prop_assert!(backend.reservation_count(resource.id) <= capacity as usize);
            prop_assert_eq!(backend.reservation_count(resource.id), model.len());
        }
        Ok(())
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn service_matches_sequential_model(
        capacity in 0u32..5,
        ops in operations(SUBJECTS, 40),
    ) {
        run(capacity, &ops)?;
    }
}
