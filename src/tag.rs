/*!
 * Thread Tags
 *
 * Type-safe thread identity for mutex ownership bookkeeping. Tags are
 * assigned lazily from a global counter and cached per thread; tag 0 is
 * reserved for "no owner".
 */

use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

/// Thread tag (32-bit)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThreadTag(pub u32);

/// Next tag to hand out. Starts at 1; 0 means "unowned".
static NEXT_TAG: AtomicU32 = AtomicU32::new(1);

thread_local! {
    static CURRENT_TAG: Cell<u32> = const { Cell::new(0) };
}

impl ThreadTag {
    /// The "no owner" tag.
    pub const NONE: ThreadTag = ThreadTag(0);

    /// Tag of the calling thread, assigned on first use.
    pub fn current() -> ThreadTag {
        CURRENT_TAG.with(|cell| {
            let mut tag = cell.get();
            if tag == 0 {
                tag = NEXT_TAG.fetch_add(1, Ordering::Relaxed);
                cell.set(tag);
            }
            ThreadTag(tag)
        })
    }

    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for ThreadTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
