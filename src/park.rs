/*!
 * Park-Based Native Backend
 *
 * Implements the native wait/wake seam on parking_lot_core. On Linux the
 * parking lot bottoms out in futex syscalls; elsewhere it falls back to the
 * platform's thread parker, so this backend works everywhere.
 *
 * # Lost-wakeup protection
 *
 * The raw lock must be released before the thread can park, which opens a
 * window where a wake could slip by unseen. An epoch counter closes it:
 * waiters read the epoch while still holding the lock, wakers bump it
 * before unparking, and the park validate callback (run under the parking
 * queue lock) refuses to sleep if the epoch moved. A refused park counts as
 * woken.
 */

use crate::native::{NativeCondvar, NativeStatus, WakeResult};
use crate::raw::RawLock;
use parking_lot_core::{park, unpark_all, unpark_one, ParkResult, ParkToken, UnparkToken};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Production native condvar backend.
///
/// All orderings are `Relaxed`: cross-thread synchronization of the guarded
/// state is done by the raw lock itself, and the epoch check runs under the
/// parking queue lock.
#[repr(C, align(64))] // Cache-line aligned to prevent false sharing
pub struct ParkCondvar {
    /// Bumped on every wake; parked on as the validation word.
    epoch: AtomicUsize,
    /// Threads between raw-lock release and wakeup.
    waiters: AtomicUsize,
}

impl ParkCondvar {
    pub const fn new() -> Self {
        Self {
            epoch: AtomicUsize::new(0),
            waiters: AtomicUsize::new(0),
        }
    }

    /// Stable parking address for this condvar (same in wait and wake).
    #[inline]
    fn park_addr(&self) -> usize {
        self as *const Self as usize
    }

    fn wait_inner(&self, lock: &RawLock, deadline: Option<Instant>) -> NativeStatus {
        let epoch = self.epoch.load(Ordering::Relaxed);
        self.waiters.fetch_add(1, Ordering::Relaxed);

        // SAFETY: the wait contract requires the caller to hold `lock`.
        unsafe { lock.unlock() };

        // SAFETY: park_addr is stable for the lifetime of &self and only
        // used with this condvar's queue.
        let result = unsafe {
            park(
                self.park_addr(),
                || self.epoch.load(Ordering::Relaxed) == epoch,
                || {},
                |_, _| {},
                ParkToken(0),
                deadline,
            )
        };

        self.waiters.fetch_sub(1, Ordering::Relaxed);

        // Reacquire before returning, on every path.
        lock.lock();

        match result {
            ParkResult::Unparked(_) => NativeStatus::Woken,
            // A wake moved the epoch between our unlock and the park.
            ParkResult::Invalid => NativeStatus::Woken,
            ParkResult::TimedOut => NativeStatus::TimedOut,
        }
    }
}

impl Default for ParkCondvar {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeCondvar for ParkCondvar {
    fn wake_one(&self) -> WakeResult {
        if self.waiters.load(Ordering::Relaxed) == 0 {
            return WakeResult::NoWaiters;
        }

        self.epoch.fetch_add(1, Ordering::Relaxed);

        // SAFETY: addresses match the park calls on this condvar.
        let result = unsafe { unpark_one(self.park_addr(), |_| UnparkToken(0)) };

        // unparked_threads can be 0 if the waiter had not parked yet; the
        // epoch bump guarantees its validate callback fails instead.
        WakeResult::Woken(result.unparked_threads)
    }

    fn wake_all(&self) -> WakeResult {
        if self.waiters.load(Ordering::Relaxed) == 0 {
            return WakeResult::NoWaiters;
        }

        self.epoch.fetch_add(1, Ordering::Relaxed);

        // SAFETY: addresses match the park calls on this condvar.
        let unparked = unsafe { unpark_all(self.park_addr(), UnparkToken(0)) };

        WakeResult::Woken(unparked)
    }

    fn wait(&self, lock: &RawLock) -> NativeStatus {
        self.wait_inner(lock, None)
    }

    fn wait_timeout(&self, lock: &RawLock, timeout_ns: u64) -> NativeStatus {
        // Saturate unrepresentable deadlines to an unbounded wait.
        let deadline = Instant::now().checked_add(Duration::from_nanos(timeout_ns));
        self.wait_inner(lock, deadline)
    }

    fn waiter_count(&self) -> usize {
        self.waiters.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    struct Pair {
        cv: ParkCondvar,
        lock: RawLock,
    }

    #[test]
    fn timeout_expires_with_lock_reacquired() {
        let pair = Pair {
            cv: ParkCondvar::new(),
            lock: RawLock::new(),
        };

        pair.lock.lock();
        let start = Instant::now();
        let status = pair.cv.wait_timeout(&pair.lock, 50 * 1_000_000);
        assert_eq!(status, NativeStatus::TimedOut);
        assert!(start.elapsed() >= Duration::from_millis(50));

        // The lock came back: a second acquisition attempt must fail.
        assert!(!pair.lock.try_lock());
        unsafe { pair.lock.unlock() };
    }

    #[test]
    fn wake_one_releases_a_waiter() {
        let pair = Arc::new(Pair {
            cv: ParkCondvar::new(),
            lock: RawLock::new(),
        });
        let pair2 = pair.clone();

        let handle = thread::spawn(move || {
            pair2.lock.lock();
            let status = pair2.cv.wait(&pair2.lock);
            unsafe { pair2.lock.unlock() };
            status
        });

        // Give the thread time to park, then keep waking until it is gone.
        thread::sleep(Duration::from_millis(50));
        while pair.cv.waiter_count() > 0 {
            pair.cv.wake_one();
            thread::yield_now();
        }

        assert_eq!(handle.join().unwrap(), NativeStatus::Woken);
    }

    #[test]
    fn wake_without_waiters_is_noop() {
        let cv = ParkCondvar::new();
        assert_eq!(cv.wake_one(), WakeResult::NoWaiters);
        assert_eq!(cv.wake_all(), WakeResult::NoWaiters);
        assert_eq!(cv.waiter_count(), 0);
    }

    #[test]
    fn wake_all_releases_everyone() {
        let pair = Arc::new(Pair {
            cv: ParkCondvar::new(),
            lock: RawLock::new(),
        });

        let handles: Vec<_> = (0..3)
            .map(|_| {
                let pair = pair.clone();
                thread::spawn(move || {
                    pair.lock.lock();
                    let status = pair.cv.wait(&pair.lock);
                    unsafe { pair.lock.unlock() };
                    status
                })
            })
            .collect();

        thread::sleep(Duration::from_millis(100));
        while pair.cv.waiter_count() > 0 {
            pair.cv.wake_all();
            thread::yield_now();
        }

        for handle in handles {
            assert_eq!(handle.join().unwrap(), NativeStatus::Woken);
        }
    }
}
