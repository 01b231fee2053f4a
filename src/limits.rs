/*!
 * Crate Limits and Constants
 *
 * Centralized location for tunable limits, with rationale.
 */

/// Default capacity of a condvar registry.
///
/// Each slot is a pointer-sized entry plus one parked-queue epoch word, so
/// even the full table stays well under a page of bookkeeping. Raise via
/// `RegistryConfig` for workloads that hand out per-connection condvars.
pub const DEFAULT_MAX_CONDVARS: usize = 4096;

/// Nanoseconds per millisecond, for converting caller timeouts into the
/// native primitive's timeout unit.
pub const NANOS_PER_MILLI: u64 = 1_000_000;
