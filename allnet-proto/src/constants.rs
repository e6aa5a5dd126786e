//! Flat, derivation-commented constants for wire sizes, in the style of the
//! teacher's `tox-proto::constants` module.

/// Fixed 24-byte header present on every packet with no transport-header
/// extension (spec §6).
pub const HEADER_SIZE: usize = 24;

/// Size of the `mgmt_type` sub-header appended to `ALLNET_TYPE_MGMT`
/// packets.
pub const MGMT_TYPE_SIZE: usize = 1;

/// `header(t)`: header size plus `t` bytes of transport-header extension.
/// No transport extension bits are defined yet in this spec revision, so
/// `t` is always 0, but the macro shape is kept for forward compatibility
/// with spec §4.1's size macros.
pub const fn header_size(t: usize) -> usize {
    HEADER_SIZE + t
}

pub const fn mgmt_header_size(t: usize) -> usize {
    header_size(t) + MGMT_TYPE_SIZE
}

/// Fixed portion of a trace request body (excludes the variable entries
/// vector and the optional public key): `intermediate_replies(1) |
/// num_entries(1) | pubkey_size(2) | trace_id(16)`.
pub const TRACE_REQ_FIXED_SIZE: usize = 1 + 1 + 2 + 16;

/// Size of one trace path entry: `precision(1) | reserved(3) | seconds(8) |
/// seconds_fraction(8) | nbits(1) | hops_seen(1) | reserved(2) |
/// address(8)`.
pub const TRACE_ENTRY_SIZE: usize = 1 + 3 + 8 + 8 + 1 + 1 + 2 + 8;

/// `TRACE_REQ_SIZE(t, n, k)` from spec §4.1: header, mgmt header, fixed
/// trace-request body, `n` entries, and a `k`-byte public key.
pub const fn trace_req_size(t: usize, n: usize, k: usize) -> usize {
    mgmt_header_size(t) + TRACE_REQ_FIXED_SIZE + n * TRACE_ENTRY_SIZE + k
}

/// Beacon body: `receiver_nonce(32) | awake_time_ns(8)`.
pub const BEACON_BODY_SIZE: usize = 32 + 8;

/// Beacon-reply body: beacon body plus `sender_nonce(32)`.
pub const BEACON_REPLY_BODY_SIZE: usize = BEACON_BODY_SIZE + 32;

/// Beacon-grant body: beacon-reply body plus `send_time_ns(8)`.
pub const BEACON_GRANT_BODY_SIZE: usize = BEACON_REPLY_BODY_SIZE + 8;

/// 16-byte opaque identifiers (message id, trace id, nonce halves are
/// 32 bytes each, handled separately).
pub const ID_SIZE: usize = 16;

/// Pipe-message framing header: `magic(1) | length(4) | priority(4)`.
pub const PIPE_HEADER_SIZE: usize = 1 + 4 + 4;

/// Magic byte prefixing every pipe-message header.
pub const PIPE_MAGIC: u8 = 0xa1;
