/*!
 * Raw Lock
 *
 * The ownership-unaware lock the native wait call operates on directly.
 * The type is public because it appears in the `NativeCondvar` trait, but
 * every method is crate-private: outside this crate the ownership layer on
 * `OwnedMutex` cannot be bypassed.
 */

use parking_lot::lock_api::RawMutex as _;
use std::fmt;

/// Opaque low-level lock consumed by the native wait primitive.
pub struct RawLock {
    inner: parking_lot::RawMutex,
}

impl RawLock {
    pub(crate) const fn new() -> Self {
        Self {
            inner: parking_lot::RawMutex::INIT,
        }
    }

    /// Block until the lock is acquired.
    #[inline]
    pub(crate) fn lock(&self) {
        self.inner.lock();
    }

    /// Acquire without blocking. Returns `true` on success.
    #[inline]
    pub(crate) fn try_lock(&self) -> bool {
        self.inner.try_lock()
    }

    /// Release the lock.
    ///
    /// # Safety
    ///
    /// The calling thread must currently hold the lock.
    #[inline]
    pub(crate) unsafe fn unlock(&self) {
        self.inner.unlock();
    }
}

impl fmt::Debug for RawLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawLock").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_excludes_try_lock() {
        let raw = RawLock::new();
        raw.lock();
        assert!(!raw.try_lock());
        // SAFETY: locked above on this thread
        unsafe { raw.unlock() };
        assert!(raw.try_lock());
        unsafe { raw.unlock() };
    }
}
