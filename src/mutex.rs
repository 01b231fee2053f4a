/*!
 * Owned Recursive Mutex
 *
 * A raw lock plus ownership bookkeeping: the tag of the owning thread and a
 * recursion depth. Invariant: owned implies `owner` is the holder's tag and
 * `depth >= 1`; unowned implies both are zero.
 *
 * The bookkeeping fields are written only by the current logical owner
 * while the raw lock is held — directly, or through the native primitive's
 * hand-off during a condition wait. Other threads read them only for the
 * recursion fast path and diagnostics, so `Relaxed` atomics suffice.
 */

use crate::errors::{record, SyncError, SyncResult};
use crate::raw::RawLock;
use crate::tag::ThreadTag;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

/// Recursive mutex with thread-tag ownership tracking.
pub struct OwnedMutex {
    raw: RawLock,
    /// Tag of the owning thread, `ThreadTag::NONE` when unowned.
    owner: AtomicU32,
    /// Times the owner has acquired without releasing.
    depth: AtomicU32,
}

impl OwnedMutex {
    pub const fn new() -> Self {
        Self {
            raw: RawLock::new(),
            owner: AtomicU32::new(0),
            depth: AtomicU32::new(0),
        }
    }

    /// Acquire the mutex, blocking if another thread owns it. Reentrant:
    /// the owner may call this again and must unlock once per lock.
    pub fn lock(&self) {
        let me = ThreadTag::current();
        if self.owner_tag() == me {
            self.depth.fetch_add(1, Ordering::Relaxed);
            return;
        }

        self.raw.lock();
        self.owner.store(me.as_u32(), Ordering::Relaxed);
        self.depth.store(1, Ordering::Relaxed);
    }

    /// Acquire without blocking. Returns `true` if the calling thread now
    /// owns the mutex (including reentrant acquisitions).
    pub fn try_lock(&self) -> bool {
        let me = ThreadTag::current();
        if self.owner_tag() == me {
            self.depth.fetch_add(1, Ordering::Relaxed);
            return true;
        }

        if !self.raw.try_lock() {
            return false;
        }
        self.owner.store(me.as_u32(), Ordering::Relaxed);
        self.depth.store(1, Ordering::Relaxed);
        true
    }

    /// Release one level of ownership. The raw lock is released only when
    /// the depth returns to zero.
    pub fn unlock(&self) -> SyncResult<()> {
        if self.owner_tag() != ThreadTag::current() {
            return Err(record(SyncError::NotOwner));
        }

        if self.depth.fetch_sub(1, Ordering::Relaxed) == 1 {
            self.owner.store(ThreadTag::NONE.as_u32(), Ordering::Relaxed);
            // SAFETY: the calling thread is the owner, so it holds the raw
            // lock, and depth just reached zero.
            unsafe { self.raw.unlock() };
        }
        Ok(())
    }

    /// Whether the calling thread is the current logical owner.
    #[inline]
    pub fn is_owned_by_current(&self) -> bool {
        self.owner_tag() == ThreadTag::current()
    }

    /// Tag of the current owner (diagnostic read).
    #[inline]
    pub fn owner_tag(&self) -> ThreadTag {
        ThreadTag(self.owner.load(Ordering::Relaxed))
    }

    /// Current recursion depth (diagnostic read).
    #[inline]
    pub fn recursion_depth(&self) -> u32 {
        self.depth.load(Ordering::Relaxed)
    }

    /// The bare lock handed to the native wait call.
    #[inline]
    pub(crate) fn raw(&self) -> &RawLock {
        &self.raw
    }

    /// Overwrite both bookkeeping fields. Only the condition variable's
    /// ownership guard may call this, and only from the owning thread.
    #[inline]
    pub(crate) fn set_bookkeeping(&self, owner: ThreadTag, depth: u32) {
        self.owner.store(owner.as_u32(), Ordering::Relaxed);
        self.depth.store(depth, Ordering::Relaxed);
    }
}

impl Default for OwnedMutex {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for OwnedMutex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnedMutex")
            .field("owner", &self.owner_tag())
            .field("depth", &self.recursion_depth())
            .finish()
    }
}
