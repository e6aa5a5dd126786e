//! Flat cycle-timing and queue-bound constants (spec §4.8), in the style
//! of `allnet-proto::constants` — compile-time tuning rather than a
//! runtime config struct, matching the original's fixed schedule.

/// Length of one `abc` cycle.
pub const BASIC_CYCLE_MS: u64 = 5_000;

/// Length of the beacon slot within a cycle: `1/100` of `BASIC_CYCLE_MS`.
pub const BEACON_MS: u64 = BASIC_CYCLE_MS / 100;

/// How long a node waits in `ReplySent` for a matching grant before
/// resetting its beacon state to `None`.
pub const BEACON_DEADLINE_MS: u64 = 250;

/// Anti-monopoly cap on how far an overheard grant (addressed to someone
/// else) can push out our own quiet-until deadline.
pub const QUIET_CAP_MS: u64 = 50;

/// A queue entry is dropped once its backoff exponent reaches this value
/// (after at least `2^MAX_BACKOFF_EXPONENT` cycles of exponential
/// backoff).
pub const MAX_BACKOFF_EXPONENT: u8 = 8;

/// Bound on the total bytes held by the transmit queue.
pub const QUEUE_MAX_BYTES: usize = 16 * 1024 * 1024;

/// Lower bound of the reply-delay window used when the remaining awake
/// time is not short (spec §4.8 reply-delay policy).
pub const REPLY_DELAY_FLOOR_MS: u64 = 25;

/// Upper bound (inclusive) of that same window.
pub const REPLY_DELAY_CEILING_MS: u64 = 49;

/// Below this remaining-awake-time threshold, the reply is instead
/// scheduled somewhere in the first half of what's left.
pub const REPLY_DELAY_SHORT_WINDOW_MS: u64 = 100;
