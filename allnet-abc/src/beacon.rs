//! The beacon finite-state machine and the `BroadcastChannel` that bundles
//! it with nonces, cycle count, and high/low priority mode (spec
//! §3/§4.8/§9). Event-handler methods (`on_own_beacon`, `on_peer_beacon`,
//! `on_beacon_reply`, `on_beacon_grant`, `on_cycle_tick`) make the FSM
//! unit-testable without any socket — exactly the redesign spec §9 calls
//! for in place of the original's file-scope statics.

use rand::RngCore;

use allnet_proto::header::{BeaconBody, BeaconGrantBody, BeaconReplyBody};
use allnet_proto::priority::FRIENDS_LOW;
use allnet_proto::Priority;

use crate::constants::{
    QUIET_CAP_MS, REPLY_DELAY_CEILING_MS, REPLY_DELAY_FLOOR_MS, REPLY_DELAY_SHORT_WINDOW_MS,
};
use crate::queue::TransmitQueue;

/// Per-cycle beacon state (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeaconState {
    None,
    Sent,
    ReplySent,
    GrantSent,
}

/// The four 32-byte nonces that pair a beacon exchange (spec §3): a grant
/// is only accepted if `(other_rnonce, other_snonce)` matches what we
/// previously replied with, and a reply is only accepted if its
/// `receiver_nonce` equals `my_rnonce`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Nonces {
    pub my_rnonce: [u8; 32],
    pub my_snonce: [u8; 32],
    pub other_rnonce: [u8; 32],
    pub other_snonce: [u8; 32],
}

/// The bundled beacon FSM: state, nonces, cycle counter, and the
/// quiet-until deadline all threaded as one handle, per spec §9's
/// `BroadcastChannel` redesign note.
pub struct BroadcastChannel {
    state: BeaconState,
    nonces: Nonces,
    cycle: u64,
    quiet_until_ns: u64,
    received_high_priority_this_cycle: bool,
    queue: TransmitQueue,
}

impl Default for BroadcastChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl BroadcastChannel {
    pub fn new() -> Self {
        Self {
            state: BeaconState::None,
            nonces: Nonces::default(),
            cycle: 0,
            quiet_until_ns: 0,
            received_high_priority_this_cycle: false,
            queue: TransmitQueue::new(),
        }
    }

    pub fn state(&self) -> BeaconState {
        self.state
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn quiet_until_ns(&self) -> u64 {
        self.quiet_until_ns
    }

    pub fn queue(&self) -> &TransmitQueue {
        &self.queue
    }

    pub fn queue_mut(&mut self) -> &mut TransmitQueue {
        &mut self.queue
    }

    /// Starts a new cycle: resets the beacon state to `None` and clears
    /// the high-priority-this-cycle flag (spec §4.8: "basic cycle" is
    /// 5 seconds, and the FSM is per-cycle).
    pub fn on_cycle_tick(&mut self, cycle: u64) {
        self.cycle = cycle;
        self.state = BeaconState::None;
        self.received_high_priority_this_cycle = false;
    }

    /// Records that we received a high-priority packet this cycle, for
    /// the high/low mode computation below.
    pub fn note_high_priority_received(&mut self) {
        self.received_high_priority_this_cycle = true;
    }

    /// *High* iff a high-priority packet arrived this cycle, or the
    /// queue's max-priority entry is at least [`FRIENDS_LOW`] (spec
    /// §4.8). In high mode the interface stays on across cycles; in low
    /// mode it is powered off after the beacon window absent a pending
    /// grant.
    pub fn is_high_priority_mode(&self) -> bool {
        self.received_high_priority_this_cycle
            || self.queue.max_priority().unwrap_or(0) >= FRIENDS_LOW
    }

    /// NONE -> SENT: transmits our own beacon with a fresh `my_rnonce`.
    pub fn send_own_beacon<R: RngCore>(&mut self, rng: &mut R, awake_time_ns: u64) -> BeaconBody {
        let mut my_rnonce = [0u8; 32];
        rng.fill_bytes(&mut my_rnonce);
        self.nonces.my_rnonce = my_rnonce;
        self.state = BeaconState::Sent;
        BeaconBody {
            receiver_nonce: my_rnonce,
            awake_time_ns,
        }
    }

    /// NONE -> REPLY_SENT: replies to a peer's beacon. Per spec §4.8 this
    /// requires our queue to be non-empty; otherwise the beacon is
    /// ignored (returns `None`, state unchanged).
    pub fn on_peer_beacon<R: RngCore>(
        &mut self,
        rng: &mut R,
        peer_beacon: &BeaconBody,
    ) -> Option<BeaconReplyBody> {
        if self.state != BeaconState::None || self.queue.is_empty() {
            return None;
        }
        let mut my_snonce = [0u8; 32];
        rng.fill_bytes(&mut my_snonce);
        self.nonces.other_rnonce = peer_beacon.receiver_nonce;
        self.nonces.other_snonce = my_snonce;
        self.state = BeaconState::ReplySent;
        Some(BeaconReplyBody {
            receiver_nonce: peer_beacon.receiver_nonce,
            awake_time_ns: peer_beacon.awake_time_ns,
            sender_nonce: my_snonce,
        })
    }

    /// SENT -> GRANT_SENT: accepts a beacon-reply whose `receiver_nonce`
    /// equals `my_rnonce` and emits a grant echoing the reply's nonce
    /// pair plus a permitted send time; any other reply is ignored.
    pub fn on_beacon_reply(
        &mut self,
        reply: &BeaconReplyBody,
        send_time_ns: u64,
    ) -> Option<BeaconGrantBody> {
        if self.state != BeaconState::Sent || reply.receiver_nonce != self.nonces.my_rnonce {
            return None;
        }
        self.nonces.other_snonce = reply.sender_nonce;
        self.state = BeaconState::GrantSent;
        Some(BeaconGrantBody {
            receiver_nonce: reply.receiver_nonce,
            awake_time_ns: reply.awake_time_ns,
            sender_nonce: reply.sender_nonce,
            send_time_ns,
        })
    }

    /// Outcome of observing a grant that was not meant for us (spec
    /// §4.8: "any state: on overhearing a grant addressed elsewhere,
    /// extend our quiet-until... but no more than 50ms").
    pub fn on_overheard_grant(&mut self, now_ns: u64, grant_send_time_ns: u64) {
        let cap_ns = QUIET_CAP_MS * 1_000_000;
        let extension = grant_send_time_ns.min(cap_ns);
        let candidate = now_ns.saturating_add(extension);
        self.quiet_until_ns = self.quiet_until_ns.max(candidate);
    }

    /// REPLY_SENT -> NONE on a matching grant: returns the bandwidth
    /// budget in bytes (`send_time_ns * bits_per_sec / 8`) we're allowed
    /// to transmit, or `None` if the grant doesn't match what we replied
    /// with (spec §4.8's "accepts a grant only if `(other_rnonce,
    /// other_snonce)` matches the ones it previously replied with").
    pub fn on_beacon_grant(&mut self, grant: &BeaconGrantBody, bits_per_sec: u64) -> Option<u64> {
        if self.state != BeaconState::ReplySent
            || grant.receiver_nonce != self.nonces.other_rnonce
            || grant.sender_nonce != self.nonces.other_snonce
        {
            return None;
        }
        self.state = BeaconState::None;
        Some(grant.send_time_ns.saturating_mul(bits_per_sec) / 8)
    }

    /// REPLY_SENT -> NONE on a beacon-deadline timeout (250ms, spec
    /// §4.8). Returns `true` if the state actually reset.
    pub fn on_beacon_deadline(&mut self, elapsed_ms: u64) -> bool {
        if self.state == BeaconState::ReplySent && elapsed_ms >= crate::constants::BEACON_DEADLINE_MS
        {
            self.state = BeaconState::None;
            true
        } else {
            false
        }
    }
}

/// Reply-delay policy (spec §4.8): on receiving a peer beacon with
/// declared `awake_time`, compute the remaining awake window. If
/// positive and under [`REPLY_DELAY_SHORT_WINDOW_MS`], schedule the reply
/// at a uniform random point in the first half of what's left; otherwise
/// schedule it uniformly in `[25ms, 49ms]`. `remaining_awake_ms` is the
/// caller-computed `awake_time - elapsed_since_beacon`.
pub fn reply_delay_ms(remaining_awake_ms: u64, rng: &mut impl RngCore) -> u64 {
    if remaining_awake_ms > 0 && remaining_awake_ms < REPLY_DELAY_SHORT_WINDOW_MS {
        let half = (remaining_awake_ms / 2).max(1);
        rng.next_u64() % half
    } else {
        let span = REPLY_DELAY_CEILING_MS - REPLY_DELAY_FLOOR_MS + 1;
        REPLY_DELAY_FLOOR_MS + (rng.next_u64() % span)
    }
}

/// Priority queued for forwarding purposes only; re-exported so callers
/// don't need a second import for the one constant `abc` itself reaches
/// for directly (`FRIENDS_LOW` boundary check above).
pub type PriorityAlias = Priority;
