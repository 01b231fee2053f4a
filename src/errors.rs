/*!
 * Error Types
 *
 * Sync error taxonomy plus the thread-local last-error side channel.
 * Validation failures are reported twice: through the returned `Err` and
 * through `last_error()`, so callers that only see a failed operation can
 * still retrieve what went wrong afterwards.
 */

use std::cell::Cell;
use thiserror::Error;

/// Result type for sync operations
pub type SyncResult<T> = Result<T, SyncError>;

/// Sync operation errors
///
/// A timed-out wait is not an error — it surfaces as
/// [`WaitOutcome::TimedOut`](crate::WaitOutcome).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncError {
    #[error("Out of condition variable slots")]
    OutOfMemory,

    #[error("Unknown or destroyed condition variable handle")]
    InvalidHandle,

    #[error("Calling thread does not own the mutex")]
    NotOwner,

    #[error("Native wait failed with code {0}")]
    Native(i32),
}

thread_local! {
    static LAST_ERROR: Cell<Option<SyncError>> = const { Cell::new(None) };
}

/// Record `err` in the calling thread's error state and hand it back,
/// so validation paths can `return Err(record(..))` in one step.
pub(crate) fn record(err: SyncError) -> SyncError {
    LAST_ERROR.with(|cell| cell.set(Some(err)));
    err
}

/// Most recent error recorded on the calling thread, if any.
pub fn last_error() -> Option<SyncError> {
    LAST_ERROR.with(|cell| cell.get())
}

/// Take and clear the calling thread's error state.
pub fn take_last_error() -> Option<SyncError> {
    LAST_ERROR.with(|cell| cell.take())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_sets_thread_error_state() {
        take_last_error();
        assert_eq!(last_error(), None);

        let err = record(SyncError::InvalidHandle);
        assert_eq!(err, SyncError::InvalidHandle);
        assert_eq!(last_error(), Some(SyncError::InvalidHandle));

        // take drains it
        assert_eq!(take_last_error(), Some(SyncError::InvalidHandle));
        assert_eq!(last_error(), None);
    }

    #[test]
    fn error_state_is_per_thread() {
        take_last_error();
        record(SyncError::OutOfMemory);

        let other = std::thread::spawn(|| last_error()).join().unwrap();
        assert_eq!(other, None);
        assert_eq!(last_error(), Some(SyncError::OutOfMemory));
    }

    #[test]
    fn display_messages() {
        assert_eq!(
            SyncError::Native(-11).to_string(),
            "Native wait failed with code -11"
        );
        assert_eq!(
            SyncError::NotOwner.to_string(),
            "Calling thread does not own the mutex"
        );
    }
}
