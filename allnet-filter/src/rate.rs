//! Per-source rate tracker (spec §3/§4.4), grounded on
//! `original_source/src/track.c`: a 128-slot ring remembers the last
//! packet seen from each slot's source; each new packet's priority
//! estimate is the fraction of total ring-resident bytes whose source
//! prefix-matches the new packet's source, scaled by the priority range.
//! Ties between sources are broken purely by insertion order, since the
//! ring always advances `next` unconditionally and never reorders.

use allnet_proto::address::matches_raw;
use allnet_proto::priority::{Priority, MAX as PRIORITY_MAX};

const SAVED_ADDRESSES: usize = 128;

#[derive(Clone, Copy)]
struct Slot {
    address: [u8; 8],
    nbits: u8,
    packet_size: u32,
}

impl Slot {
    const EMPTY: Slot = Slot {
        address: [0; 8],
        nbits: 0,
        packet_size: 0,
    };
}

pub struct RateTracker {
    ring: [Slot; SAVED_ADDRESSES],
    next: usize,
}

impl Default for RateTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl RateTracker {
    pub fn new() -> Self {
        Self {
            ring: [Slot::EMPTY; SAVED_ADDRESSES],
            next: 0,
        }
    }

    /// `largest_rate()`: the ceiling a single source's estimate can reach.
    pub fn largest_rate() -> Priority {
        PRIORITY_MAX - 1
    }

    /// Records that `source` sent a packet of `packet_size` bytes and
    /// returns its share of ring-resident traffic, scaled to
    /// `[0, PRIORITY_MAX]`. Mirrors `track_rate`'s exact integer-division
    /// order (`(PRIORITY_MAX / total) * matching`, not
    /// `matching * PRIORITY_MAX / total`), which can under-round compared
    /// to the more obvious formula but is what the original computes.
    pub fn track_rate(&mut self, source: &[u8; 8], sbits: u8, packet_size: u32) -> Priority {
        let mut total: u64 = 0;
        let mut matching: u64 = 0;
        for slot in &self.ring {
            if slot.packet_size > 0 {
                total += slot.packet_size as u64;
                if matches_raw(source, sbits, &slot.address, slot.nbits) == sbits.min(slot.nbits) {
                    matching += slot.packet_size as u64;
                }
            }
        }

        self.ring[self.next] = Slot {
            address: *source,
            nbits: sbits,
            packet_size,
        };
        self.next = (self.next + 1) % SAVED_ADDRESSES;

        matching += packet_size as u64;
        total += packet_size as u64;

        if total == 0 {
            return Self::largest_rate();
        }
        (((PRIORITY_MAX as u64) / total) * matching) as Priority
    }
}
