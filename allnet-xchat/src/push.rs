//! Deciding what to resend in response to a [`RetransmitRequest`] (spec
//! §4.10): the most recent unacknowledged messages first, then older
//! gaps from the request's singles/ranges, newest first, each assigned
//! a priority stepping down from
//! [`allnet_proto::priority::LOCAL_LOW`].

use allnet_proto::priority::{self, Priority};
use allnet_proto::RetransmitRequest;

use crate::missing::get_prev;

/// Caps how many sequence numbers a single retransmit request triggers
/// a resend for, so one request can't make a node re-send an unbounded
/// backlog in one go.
pub const MAX_RESEND_PER_REQUEST: usize = 8;

/// Sequence numbers to resend, newest first: everything sent since
/// `request.last_received` up to (but not including) `counter_now`, then
/// the request's own gaps below `last_received`, walked via
/// [`get_prev`]. Bounded to [`MAX_RESEND_PER_REQUEST`] entries.
pub fn sequence_numbers_to_resend(counter_now: u64, request: &RetransmitRequest) -> Vec<u64> {
    let mut out = Vec::new();

    let mut candidate = counter_now.saturating_sub(1);
    while candidate > request.last_received && out.len() < MAX_RESEND_PER_REQUEST {
        out.push(candidate);
        candidate -= 1;
    }

    let mut cursor = request.last_received;
    while out.len() < MAX_RESEND_PER_REQUEST {
        match get_prev(cursor, &request.singles, &request.ranges) {
            Some(prev) => {
                out.push(prev);
                cursor = prev;
            }
            None => break,
        }
    }
    out
}

/// Priorities for a resend batch, in the same order as
/// [`sequence_numbers_to_resend`]'s output: starting at `LOCAL_LOW` and
/// decreasing by `EPSILON` per entry, so the oldest resends in a batch
/// never starve behind this contact's own fresh traffic but also never
/// outrank it.
pub fn resend_priorities(count: usize) -> Vec<Priority> {
    let mut priorities = Vec::with_capacity(count);
    let mut p = priority::LOCAL_LOW;
    for _ in 0..count {
        priorities.push(p);
        p = p.saturating_sub(priority::EPSILON).max(priority::EPSILON);
    }
    priorities
}
