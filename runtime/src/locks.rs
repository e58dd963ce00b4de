//! Per-resource exclusive locks with a bounded wait.
//!
//! Each resource id maps to its own `tokio::sync::Mutex`. Holding the guard
//! for resource `A` never blocks an acquire on resource `B`. An acquire that
//! does not succeed within the configured timeout fails with
//! [`RegistrationError::Busy`] instead of queueing forever.
//!
//! These locks serialize writers **inside one process**. Deployments with
//! several processes need the row lock of the postgres backend instead.

use crate::metrics::ReservationMetrics;
use reservations_core::{RegistrationError, ResourceId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Idle slots are swept once the table grows past this many entries.
const PRUNE_THRESHOLD: usize = 1024;

/// Table of per-resource locks.
pub struct ResourceLocks {
    slots: Mutex<HashMap<ResourceId, Arc<AsyncMutex<()>>>>,
    timeout: Duration,
}

/// Exclusive hold on one resource. Released on drop.
#[derive(Debug)]
pub struct ResourceGuard {
    resource_id: ResourceId,
    _guard: OwnedMutexGuard<()>,
}

impl ResourceGuard {
    /// The locked resource.
    #[must_use]
    pub const fn resource_id(&self) -> ResourceId {
        self.resource_id
    }
}

impl ResourceLocks {
    /// Create an empty table whose acquires give up after `timeout`.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            timeout,
        }
    }

    /// Bounded wait applied to every acquire.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Number of slots currently tracked, held or idle.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no slot is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Acquire the lock for `resource_id`.
    ///
    /// # Errors
    ///
    /// [`RegistrationError::Busy`] if the lock is not granted within the timeout.
    pub async fn acquire(&self, resource_id: ResourceId) -> Result<ResourceGuard, RegistrationError> {
        let slot = self.slot(resource_id);
        let started = Instant::now();

        match tokio::time::timeout(self.timeout, slot.lock_owned()).await {
            Ok(guard) => {
                ReservationMetrics::record_lock_wait(started.elapsed());
                Ok(ResourceGuard {
                    resource_id,
                    _guard: guard,
                })
            }
            Err(_) => {
                tracing::warn!(
                    resource_id = %resource_id,
                    timeout_ms = self.timeout.as_millis(),
                    "Resource lock not acquired within timeout"
                );
                Err(RegistrationError::Busy {
                    resource_id,
                    timeout: self.timeout,
                })
            }
        }
    }

    fn slot(&self, resource_id: ResourceId) -> Arc<AsyncMutex<()>> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if slots.len() >= PRUNE_THRESHOLD {
            prune_idle(&mut slots);
        }
        Arc::clone(
            slots
                .entry(resource_id)
                .or_insert_with(|| Arc::new(AsyncMutex::new(()))),
        )
    }
}

/// Remove slots nobody holds or waits on.
///
/// A slot with a strong count of one is referenced only by the table.
/// Waiters clone the `Arc` while the table lock is held, so no acquire can
/// be in flight on a slot this removes.
fn prune_idle(slots: &mut HashMap<ResourceId, Arc<AsyncMutex<()>>>) {
    slots.retain(|_, slot| Arc::strong_count(slot) > 1);
}

impl std::fmt::Debug for ResourceLocks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceLocks")
            .field("slots", &self.len())
            .field("timeout", &self.timeout)
            .finish()
    }
}
