//! Trace client: builds the initial request and correlates incoming
//! replies by round-trip time (spec §4.9 client side).

use std::collections::HashMap;
use std::time::{Duration, Instant};

use rand::RngCore;

use allnet_proto::{Address, TraceEntry, TraceReply, TraceRequest};

/// How long a client waits for replies before giving up (spec §4.9:
/// "receive replies for up to 60 s").
pub const CLIENT_TIMEOUT: Duration = Duration::from_secs(60);

/// Builds a fresh trace request: a random 16-byte trace id, a single
/// entry for ourselves, and `intermediate_replies` set (spec §4.9).
pub fn build_request<R: RngCore>(
    rng: &mut R,
    my_entry: TraceEntry,
    reply_pubkey: Vec<u8>,
) -> TraceRequest {
    let mut trace_id = [0u8; 16];
    rng.fill_bytes(&mut trace_id);
    TraceRequest {
        intermediate_replies: true,
        trace_id,
        entries: vec![my_entry],
        pubkey: reply_pubkey,
    }
}

/// One client-side trace in progress: tracks when it started and the
/// first-arrival time recorded for each `hops_seen` index, so repeat
/// replies about the same hop (from racing intermediate responders) use
/// the earliest timing rather than a later, skewed one.
pub struct TraceClient {
    started_at: Instant,
    first_arrival: HashMap<u8, Instant>,
}

impl TraceClient {
    pub fn new(now: Instant) -> Self {
        Self {
            started_at: now,
            first_arrival: HashMap::new(),
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.started_at) >= CLIENT_TIMEOUT
    }

    /// Records a reply's entries, returning `(hops_seen, rtt)` pairs for
    /// every entry whose `hops_seen` we have not already recorded (spec:
    /// "correlating RTT using the first-arrival time for each hops_seen
    /// index").
    pub fn record_reply(&mut self, reply: &TraceReply, now: Instant) -> Vec<(u8, Duration)> {
        let mut newly_recorded = Vec::new();
        for entry in &reply.entries {
            if let std::collections::hash_map::Entry::Vacant(slot) =
                self.first_arrival.entry(entry.hops_seen)
            {
                slot.insert(now);
                newly_recorded.push((entry.hops_seen, now.duration_since(self.started_at)));
            }
        }
        newly_recorded
    }
}

/// `trace [<addr>[/<bits>]]`-style client entry for a self-address of
/// unspecified/unknown bits (spec §4.9: "a random ... source address").
pub fn random_source_address<R: RngCore>(rng: &mut R, nbits: u8) -> Address {
    let mut bytes = [0u8; 8];
    rng.fill_bytes(&mut bytes);
    Address::new(bytes, nbits).expect("nbits <= 64 by construction of caller")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn entry(hops_seen: u8) -> TraceEntry {
        TraceEntry {
            precision: 64,
            seconds: 0,
            seconds_fraction: 0,
            nbits: 16,
            hops_seen,
            address: Address::new([1, 2, 0, 0, 0, 0, 0, 0], 16).unwrap(),
        }
    }

    #[test]
    fn request_has_one_self_entry_and_intermediate_replies_set() {
        let mut rng = StdRng::seed_from_u64(1);
        let req = build_request(&mut rng, entry(0), vec![]);
        assert!(req.intermediate_replies);
        assert_eq!(req.entries.len(), 1);
    }

    #[test]
    fn first_arrival_wins_for_a_given_hop() {
        let start = Instant::now();
        let mut client = TraceClient::new(start);

        let first = start + Duration::from_millis(10);
        let recorded = client.record_reply(&TraceReply { intermediate: true, entries: vec![entry(1)] }, first);
        assert_eq!(recorded.len(), 1);

        let later = start + Duration::from_millis(50);
        let recorded2 = client.record_reply(&TraceReply { intermediate: true, entries: vec![entry(1)] }, later);
        assert!(recorded2.is_empty()); // hop 1 already recorded at `first`
    }

    #[test]
    fn distinct_hops_are_recorded_independently() {
        let start = Instant::now();
        let mut client = TraceClient::new(start);
        let recorded = client.record_reply(
            &TraceReply { intermediate: true, entries: vec![entry(1), entry(2)] },
            start + Duration::from_millis(5),
        );
        assert_eq!(recorded.len(), 2);
    }

    #[test]
    fn expiry_after_timeout() {
        let start = Instant::now();
        let client = TraceClient::new(start);
        assert!(!client.is_expired(start + Duration::from_secs(59)));
        assert!(client.is_expired(start + Duration::from_secs(60)));
    }
}
