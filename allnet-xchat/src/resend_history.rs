//! Resend-history dedup ring (spec §4.10): suppresses re-resending a
//! sequence number we already resent to the same keyset within the last
//! [`RESEND_WINDOW_SECS`], so a flurry of retransmit requests arriving
//! close together doesn't re-trigger the same retransmission repeatedly.

use allnet_store::KeysetId;

/// How many distinct resends this ring remembers before the oldest
/// entry is overwritten.
pub const RING_SIZE: usize = 100;

/// Window within which a repeat resend of the same sequence number to
/// the same keyset is suppressed.
pub const RESEND_WINDOW_SECS: u64 = 600;

#[derive(Debug, Clone, Copy)]
struct Entry {
    sequence: u64,
    keyset: KeysetId,
    sent_at: u64,
}

#[derive(Debug)]
pub struct ResendHistory {
    ring: [Option<Entry>; RING_SIZE],
    next: usize,
}

impl Default for ResendHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl ResendHistory {
    pub fn new() -> Self {
        Self {
            ring: [None; RING_SIZE],
            next: 0,
        }
    }

    /// Whether `sequence` was resent to `keyset` within the dedup window
    /// ending at `now` (seconds since the AllNet epoch).
    pub fn was_recently_resent(&self, sequence: u64, keyset: KeysetId, now: u64) -> bool {
        self.ring.iter().flatten().any(|e| {
            e.sequence == sequence
                && e.keyset == keyset
                && now.saturating_sub(e.sent_at) < RESEND_WINDOW_SECS
        })
    }

    /// Records a resend, evicting the oldest ring slot if full.
    pub fn record(&mut self, sequence: u64, keyset: KeysetId, now: u64) {
        self.ring[self.next] = Some(Entry {
            sequence,
            keyset,
            sent_at: now,
        });
        self.next = (self.next + 1) % RING_SIZE;
    }

    /// Records `sequence` only if it was not already resent recently,
    /// returning whether it was newly recorded (i.e. whether the caller
    /// should actually go ahead and resend).
    pub fn record_if_due(&mut self, sequence: u64, keyset: KeysetId, now: u64) -> bool {
        if self.was_recently_resent(sequence, keyset, now) {
            return false;
        }
        self.record(sequence, keyset, now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_resend_is_due_second_within_window_is_not() {
        let mut history = ResendHistory::new();
        assert!(history.record_if_due(7, 1, 1_000));
        assert!(!history.record_if_due(7, 1, 1_300));
    }

    #[test]
    fn resend_is_due_again_after_the_window_passes() {
        let mut history = ResendHistory::new();
        assert!(history.record_if_due(7, 1, 1_000));
        assert!(history.record_if_due(7, 1, 1_000 + RESEND_WINDOW_SECS));
    }

    #[test]
    fn distinct_keysets_are_independent() {
        let mut history = ResendHistory::new();
        assert!(history.record_if_due(7, 1, 1_000));
        assert!(history.record_if_due(7, 2, 1_000));
    }

    #[test]
    fn ring_eventually_forgets_the_oldest_entry() {
        let mut history = ResendHistory::new();
        history.record(1, 1, 0);
        for i in 0..RING_SIZE {
            history.record(100 + i as u64, 1, 0);
        }
        assert!(!history.was_recently_resent(1, 1, 0));
    }
}
