/// AllNet priorities are a 32-bit fraction of [`Priority::MAX`], used for
/// transmit queue ordering, `abc` mode switching, and cacheability at
/// intermediate nodes (spec §3/§6). Named constants below canonicalize the
/// values that the original C sources left scattered across `priority.h`
/// and several `aping.c` variants (spec §9, "Open questions").
pub type Priority = u32;

/// Upper bound for any priority value.
pub const MAX: Priority = u32::MAX;

/// Minimal positive priority: "send on whatever link is available".
pub const EPSILON: Priority = 1;

/// Control traffic addressed purely to the local contact (retransmit
/// requests, acks for local-only deliveries).
pub const LOCAL_LOW: Priority = MAX / 64;

/// Background/low-priority application data.
pub const DEFAULT_LOW: Priority = MAX / 32;

/// A forwarded trace request/reply at an intermediate node — deliberately
/// below a node's own data traffic so transit trace load cannot crowd out
/// local applications.
pub const TRACE_FWD: Priority = MAX / 16;

/// Ordinary application data.
pub const DEFAULT: Priority = MAX / 8;

/// A trace client's own request/reply.
pub const TRACE: Priority = MAX / 6;

/// The high/low-priority mode boundary for `abc` (spec §4.8): a node in
/// "high" mode keeps its interface on across cycles.
pub const FRIENDS_LOW: Priority = MAX / 4;

/// High-priority application data (e.g. an ack-requested message to a
/// direct contact).
pub const DEFAULT_HIGH: Priority = MAX / 2;
