//! Trace responder logic (spec §4.9): loop suppression via [`TraceCache`],
//! forward-copy construction, and intermediate/final reply construction.
//! Pure decision logic — sending the forward copy and reply as actual
//! wire packets (wrapping them in a [`allnet_proto::Header`] /
//! [`allnet_proto::MgmtBody`]) is the caller's job.

use allnet_proto::priority::{Priority, TRACE_FWD};
use allnet_proto::{Address, TraceEntry, TraceReply, TraceRequest};

use crate::cache::TraceCache;

/// A responding node's forwarding discipline (spec §4.9): whether it
/// always forwards verbatim, only appends itself when it doesn't
/// prefix-match the destination, or (the default) always appends itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponderMode {
    Normal,
    ForwardOnly,
    MatchOnly,
}

/// Everything the responder needs to know about where it sits relative
/// to this particular request, independent of the request's own
/// contents.
pub struct TraceContext<'a> {
    pub my_address: &'a Address,
    pub destination: &'a Address,
    pub mode: ResponderMode,
    /// The inbound packet's `hops` field (spec §6): `0` means we are the
    /// first hop away from the original sender.
    pub inbound_hops: u8,
}

impl TraceContext<'_> {
    /// Exact-match: `matches(me, dest) >= min(my_bits, dest_bits)` (spec
    /// §4.9), i.e. our address is at least as specific as the
    /// destination's prefix requires.
    pub fn is_exact_match(&self) -> bool {
        let needed = self.my_address.nbits().min(self.destination.nbits());
        self.my_address.matches(self.destination) >= needed
    }
}

/// The two things a non-duplicate request may produce: a forward copy
/// (with its priority) and/or a reply.
pub struct RespondOutcome {
    pub forward: Option<(TraceRequest, Priority)>,
    pub reply: Option<TraceReply>,
}

/// `respond_to_trace`: checks `request.trace_id` against `cache` for loop
/// suppression (spec invariant 6), and if new, builds the forward copy
/// and optional reply per spec §4.9's rules. Returns `None` if the
/// request is a duplicate (drop silently).
pub fn respond_to_trace(
    cache: &mut TraceCache,
    request: &TraceRequest,
    ctx: &TraceContext,
    my_entry: TraceEntry,
) -> Option<RespondOutcome> {
    if cache.check_and_insert(request.trace_id) {
        return None;
    }

    let exact_match = ctx.is_exact_match();
    let forward = Some((build_forward_copy(request, ctx, exact_match, my_entry), TRACE_FWD));
    let reply = build_reply(request, ctx, exact_match, my_entry);

    Some(RespondOutcome { forward, reply })
}

/// Forwards verbatim if we are `ForwardOnly`, or `MatchOnly` and do not
/// exact-match the destination; otherwise appends our own entry to the
/// accumulated path (spec §4.9 step 2).
fn build_forward_copy(
    request: &TraceRequest,
    ctx: &TraceContext,
    exact_match: bool,
    my_entry: TraceEntry,
) -> TraceRequest {
    let verbatim = matches!(ctx.mode, ResponderMode::ForwardOnly)
        || (matches!(ctx.mode, ResponderMode::MatchOnly) && !exact_match);

    if verbatim {
        request.clone()
    } else {
        let mut entries = request.entries.clone();
        entries.push(my_entry);
        TraceRequest {
            entries,
            ..request.clone()
        }
    }
}

/// Builds the intermediate/final reply per spec §4.9 step 3, or `None`
/// if `intermediate_replies` is unset.
fn build_reply(
    request: &TraceRequest,
    ctx: &TraceContext,
    exact_match: bool,
    my_entry: TraceEntry,
) -> Option<TraceReply> {
    if !request.intermediate_replies {
        return None;
    }

    if exact_match {
        let mut entries = request.entries.clone();
        entries.push(my_entry);
        return Some(TraceReply {
            intermediate: false,
            entries,
        });
    }

    if ctx.inbound_hops == 0 {
        return Some(TraceReply {
            intermediate: true,
            entries: vec![my_entry],
        });
    }

    let mut entries = Vec::with_capacity(2);
    if let Some(prev) = request.entries.last() {
        entries.push(*prev);
    }
    entries.push(my_entry);
    Some(TraceReply {
        intermediate: true,
        entries,
    })
}
