/*!
 * Condition Variable
 *
 * Wait/signal/broadcast over an injected native primitive, with the paired
 * mutex's ownership bookkeeping saved, erased, and restored around every
 * blocking window.
 *
 * # Why the bookkeeping dance
 *
 * The native primitive releases and reacquires the bare `RawLock`; it knows
 * nothing about the ownership layer. If the owner tag and recursion depth
 * stayed populated while the raw lock is free, another thread acquiring it
 * through the native hand-off would observe a held-but-ownerless lock. So
 * the waiter zeroes both fields before handing its raw lock over, and a
 * scoped guard restores the snapshot on every exit path — woken, timed out,
 * native fault, or unwind.
 */

use crate::errors::{record, SyncError, SyncResult};
use crate::mutex::OwnedMutex;
use crate::native::{NativeCondvar, NativeStatus, WakeResult};
use crate::park::ParkCondvar;
use crate::tag::ThreadTag;
use std::time::{Duration, Instant};

/// Outcome of a successful wait. Callers branch on this to distinguish a
/// wake from an elapsed deadline; a timeout is a normal outcome, not an
/// error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// Released by signal/broadcast (or a spurious wakeup — re-check the
    /// predicate).
    Woken,
    /// The deadline elapsed first. Timed variants only.
    TimedOut,
}

impl WaitOutcome {
    #[inline]
    pub fn timed_out(&self) -> bool {
        matches!(self, WaitOutcome::TimedOut)
    }
}

/// Snapshot of the mutex's ownership fields, held across the native wait.
///
/// Constructing it zeroes the fields; dropping it restores the snapshot.
/// Drop runs on every exit path out of `wait_inner`, including native
/// faults and unwinds.
struct OwnershipGuard<'a> {
    mutex: &'a OwnedMutex,
    owner: ThreadTag,
    depth: u32,
}

impl<'a> OwnershipGuard<'a> {
    fn engage(mutex: &'a OwnedMutex) -> Self {
        let owner = mutex.owner_tag();
        let depth = mutex.recursion_depth();
        mutex.set_bookkeeping(ThreadTag::NONE, 0);
        Self {
            mutex,
            owner,
            depth,
        }
    }
}

impl Drop for OwnershipGuard<'_> {
    fn drop(&mut self) {
        self.mutex.set_bookkeeping(self.owner, self.depth);
    }
}

/// Condition variable over a native wait/wake primitive.
///
/// Generic over the backend for deterministic testing; defaults to the
/// park-based production backend. Monomorphized, no dynamic dispatch.
pub struct CondVar<N: NativeCondvar = ParkCondvar> {
    native: N,
}

impl CondVar<ParkCondvar> {
    /// Create a condition variable on the default park-based backend.
    pub const fn new() -> Self {
        Self {
            native: ParkCondvar::new(),
        }
    }
}

impl Default for CondVar<ParkCondvar> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: NativeCondvar> CondVar<N> {
    /// Create a condition variable on an injected backend.
    pub fn with_native(native: N) -> Self {
        Self { native }
    }

    /// Wake one blocked waiter, chosen by the native primitive with no
    /// fairness guarantee. Never blocks; a no-op when nobody waits.
    ///
    /// Holding the paired mutex is conventional but not required.
    pub fn signal(&self) -> WakeResult {
        self.native.wake_one()
    }

    /// Wake all currently-blocked waiters. Never blocks.
    ///
    /// Holding the paired mutex is conventional but not required.
    pub fn broadcast(&self) -> WakeResult {
        self.native.wake_all()
    }

    /// Block until signaled.
    ///
    /// The calling thread must own `mutex`; fails `NotOwner` otherwise,
    /// without touching the bookkeeping. The mutex is released for the
    /// duration of the wait and owned again — same owner, same recursion
    /// depth — when this returns, on every outcome.
    ///
    /// Spurious wakeups are possible; call this in a predicate re-check
    /// loop or use [`wait_while`](Self::wait_while).
    pub fn wait(&self, mutex: &OwnedMutex) -> SyncResult<WaitOutcome> {
        self.wait_inner(mutex, None)
    }

    /// Block until signaled or `timeout` elapses. Same ownership contract
    /// as [`wait`](Self::wait); an elapsed deadline is `Ok(TimedOut)`.
    pub fn wait_timeout(&self, mutex: &OwnedMutex, timeout: Duration) -> SyncResult<WaitOutcome> {
        self.wait_inner(mutex, Some(timeout))
    }

    /// Millisecond-granularity convenience over
    /// [`wait_timeout`](Self::wait_timeout).
    pub fn wait_timeout_ms(&self, mutex: &OwnedMutex, timeout_ms: u32) -> SyncResult<WaitOutcome> {
        self.wait_inner(mutex, Some(Duration::from_millis(timeout_ms as u64)))
    }

    /// Wait until `predicate` returns false, re-checking after every wake.
    ///
    /// The predicate is evaluated with the mutex held, before the first
    /// wait and after each wakeup. Returns `Woken` once the predicate is
    /// false, `TimedOut` if the deadline elapses first (the predicate may
    /// still hold).
    pub fn wait_while<F>(
        &self,
        mutex: &OwnedMutex,
        timeout: Option<Duration>,
        mut predicate: F,
    ) -> SyncResult<WaitOutcome>
    where
        F: FnMut() -> bool,
    {
        let start = Instant::now();

        loop {
            if !predicate() {
                return Ok(WaitOutcome::Woken);
            }

            let remaining = match timeout {
                None => None,
                Some(t) => {
                    let elapsed = start.elapsed();
                    if elapsed >= t {
                        return Ok(WaitOutcome::TimedOut);
                    }
                    Some(t - elapsed)
                }
            };

            self.wait_inner(mutex, remaining)?;
        }
    }

    /// Approximate count of threads blocked in this condvar (diagnostic).
    pub fn waiter_count(&self) -> usize {
        self.native.waiter_count()
    }

    fn wait_inner(&self, mutex: &OwnedMutex, timeout: Option<Duration>) -> SyncResult<WaitOutcome> {
        if !mutex.is_owned_by_current() {
            return Err(record(SyncError::NotOwner));
        }

        // Erase ownership for the blocking window; restored on drop.
        let guard = OwnershipGuard::engage(mutex);

        let status = match timeout {
            None => self.native.wait(mutex.raw()),
            Some(t) => self.native.wait_timeout(mutex.raw(), native_timeout_ns(t)),
        };

        drop(guard);

        match status {
            NativeStatus::Woken => Ok(WaitOutcome::Woken),
            NativeStatus::TimedOut => Ok(WaitOutcome::TimedOut),
            NativeStatus::Fault(code) => Err(record(SyncError::Native(code))),
        }
    }
}

/// Convert a caller timeout into the native primitive's nanosecond unit,
/// saturating on overflow.
#[inline]
fn native_timeout_ns(timeout: Duration) -> u64 {
    u64::try_from(timeout.as_nanos()).unwrap_or(u64::MAX)
}
