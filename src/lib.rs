/*!
 * Recursive-Mutex-Aware Condition Variables
 *
 * Classic wait/signal/broadcast coordination layered on a pluggable native
 * wait/wake primitive:
 * - Park-based native backend (parking_lot_core) for production use
 * - Injectable `NativeCondvar` seam for deterministic testing
 * - Recursive `OwnedMutex` whose ownership bookkeeping is saved, erased,
 *   and restored around every blocking wait
 *
 * # Architecture
 *
 * The native primitive only understands the bare `RawLock`, not the
 * ownership layer on top of it. `CondVar::wait` therefore snapshots the
 * mutex's owner tag and recursion depth, zeroes both for the duration of
 * the blocking window, and restores them on every exit path before the
 * caller re-checks its predicate.
 *
 * # Usage
 *
 * ```
 * use rcond::{CondVar, OwnedMutex};
 *
 * let cv = CondVar::new();
 * let mutex = OwnedMutex::new();
 *
 * mutex.lock();
 * // while !condition { cv.wait(&mutex)?; }
 * mutex.unlock().unwrap();
 * ```
 */

mod condvar;
mod errors;
mod mutex;
mod native;
mod park;
mod raw;
mod registry;
mod tag;

pub mod limits;

pub use condvar::{CondVar, WaitOutcome};
pub use errors::{last_error, take_last_error, SyncError, SyncResult};
pub use mutex::OwnedMutex;
pub use native::{NativeCondvar, NativeStatus, WakeResult};
pub use park::ParkCondvar;
pub use raw::RawLock;
pub use registry::{CondvarId, CondvarRegistry, RegistryConfig};
pub use tag::ThreadTag;
