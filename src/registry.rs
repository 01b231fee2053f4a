/*!
 * Condvar Registry
 *
 * Handle-based surface over [`CondVar`]: opaque ids instead of references,
 * with stale-handle validation on every operation. This is the layer that
 * owns condvar storage — create allocates a slot, destroy frees it.
 */

use crate::condvar::{CondVar, WaitOutcome};
use crate::errors::{record, SyncError, SyncResult};
use crate::limits::DEFAULT_MAX_CONDVARS;
use crate::mutex::OwnedMutex;
use crate::native::WakeResult;
use ahash::RandomState;
use dashmap::DashMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Condition variable handle (32-bit)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CondvarId(pub u32);

impl fmt::Display for CondvarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Registry configuration
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Maximum live condvars; create fails `OutOfMemory` beyond this.
    pub max_condvars: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_condvars: DEFAULT_MAX_CONDVARS,
        }
    }
}

/// Handle-based condvar manager.
///
/// Clonable; clones share the same slot table. Destroying a condvar while
/// threads are blocked inside it is a caller contract violation — waiters
/// keep the slot's storage alive through their `Arc`, but no further signal
/// can reach them through the registry.
#[derive(Clone)]
pub struct CondvarRegistry {
    slots: Arc<DashMap<CondvarId, Arc<CondVar>, RandomState>>,
    next_id: Arc<AtomicU32>,
    max_condvars: usize,
}

impl CondvarRegistry {
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            slots: Arc::new(DashMap::with_hasher(RandomState::new())),
            next_id: Arc::new(AtomicU32::new(1)),
            max_condvars: config.max_condvars,
        }
    }

    /// Allocate and initialize a condvar slot.
    ///
    /// Fails `OutOfMemory` when the slot limit is reached, leaving no
    /// partial state. The limit check is approximate under concurrent
    /// creates.
    pub fn create(&self) -> SyncResult<CondvarId> {
        if self.slots.len() >= self.max_condvars {
            return Err(record(SyncError::OutOfMemory));
        }

        let id = CondvarId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.slots.insert(id, Arc::new(CondVar::new()));
        debug!("Created condvar {}", id);
        Ok(id)
    }

    /// Free a condvar slot. Silent no-op for unknown or already-destroyed
    /// handles.
    pub fn destroy(&self, id: CondvarId) {
        if let Some((_, cv)) = self.slots.remove(&id) {
            let waiters = cv.waiter_count();
            if waiters > 0 {
                warn!("Destroyed condvar {} with {} blocked waiters", id, waiters);
            }
            debug!("Destroyed condvar {}", id);
        }
    }

    /// Wake one waiter. Fails `InvalidHandle` for unknown handles.
    pub fn signal(&self, id: CondvarId) -> SyncResult<WakeResult> {
        Ok(self.lookup(id)?.signal())
    }

    /// Wake all waiters. Fails `InvalidHandle` for unknown handles.
    pub fn broadcast(&self, id: CondvarId) -> SyncResult<WakeResult> {
        Ok(self.lookup(id)?.broadcast())
    }

    /// Block on the condvar. Handle validation happens before the mutex
    /// bookkeeping is touched.
    pub fn wait(&self, id: CondvarId, mutex: &OwnedMutex) -> SyncResult<WaitOutcome> {
        self.lookup(id)?.wait(mutex)
    }

    /// Block with a deadline. See [`CondVar::wait_timeout`].
    pub fn wait_timeout(
        &self,
        id: CondvarId,
        mutex: &OwnedMutex,
        timeout: Duration,
    ) -> SyncResult<WaitOutcome> {
        self.lookup(id)?.wait_timeout(mutex, timeout)
    }

    /// Number of live condvars.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Clone the slot out of the map so no shard guard is held across a
    /// blocking wait (destroy must never contend with a waiter).
    fn lookup(&self, id: CondvarId) -> SyncResult<Arc<CondVar>> {
        self.slots
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| record(SyncError::InvalidHandle))
    }
}

impl Default for CondvarRegistry {
    fn default() -> Self {
        Self::new()
    }
}
