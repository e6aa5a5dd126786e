//! Bounded priority transmit queue (spec §3/§4.8): a FIFO of
//! `(message_bytes, priority, backoff_exponent)` entries, bounded at
//! [`QUEUE_MAX_BYTES`](crate::constants::QUEUE_MAX_BYTES) total bytes.
//! An entry's eligibility in cycle `c` is `c mod 2^backoff_exponent == 0`;
//! on a successful transmission the exponent increments (or the entry is
//! dropped if `DO_NOT_CACHE` is set), and any entry that reaches
//! `backoff_exponent == 8` is dropped outright.

use sha2::{Digest, Sha512};

use allnet_proto::Priority;

use crate::constants::{MAX_BACKOFF_EXPONENT, QUEUE_MAX_BYTES};
use crate::error::AbcError;

/// SHA-512, truncated to 16 bytes, of a message-ack/nonce value (spec
/// §3's message ID derivation). Used both for the logical message id and
/// the per-transmission packet id: whichever 16-byte value a queue entry
/// was built with, hashing it this way is what an inbound ack packet's
/// carried value must reproduce for that entry to be evicted.
pub fn id_hash(preimage: &[u8; 16]) -> [u8; 16] {
    let digest = Sha512::digest(preimage);
    let mut out = [0u8; 16];
    out.copy_from_slice(&digest[..16]);
    out
}

#[derive(Debug, Clone)]
pub struct QueueEntry {
    pub bytes: Vec<u8>,
    pub priority: Priority,
    pub backoff_exponent: u8,
    pub do_not_cache: bool,
    /// Preimage of this entry's logical message id (spec §3): hashing it
    /// with [`id_hash`] reproduces the message id an ack packet targets.
    pub message_ack: [u8; 16],
    /// Preimage of this entry's per-transmission packet id, distinguishing
    /// individual retransmissions of the same logical message.
    pub packet_id: [u8; 16],
}

impl QueueEntry {
    pub fn message_id(&self) -> [u8; 16] {
        id_hash(&self.message_ack)
    }

    pub fn packet_id_hash(&self) -> [u8; 16] {
        id_hash(&self.packet_id)
    }
}

#[derive(Debug, Default)]
pub struct TransmitQueue {
    entries: Vec<QueueEntry>,
    total_bytes: usize,
}

impl TransmitQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[QueueEntry] {
        &self.entries
    }

    /// Highest priority currently queued, or `None` if empty. Used by the
    /// beacon FSM's high/low mode computation (spec §4.8).
    pub fn max_priority(&self) -> Option<Priority> {
        self.entries.iter().map(|e| e.priority).max()
    }

    /// `queue_add`: enqueues a new entry, failing with
    /// [`AbcError::QueueFull`] if it would push the queue's total byte
    /// count past [`QUEUE_MAX_BYTES`].
    pub fn add(
        &mut self,
        bytes: Vec<u8>,
        priority: Priority,
        do_not_cache: bool,
        message_ack: [u8; 16],
        packet_id: [u8; 16],
    ) -> Result<(), AbcError> {
        if self.total_bytes + bytes.len() > QUEUE_MAX_BYTES {
            return Err(AbcError::QueueFull);
        }
        self.total_bytes += bytes.len();
        self.entries.push(QueueEntry {
            bytes,
            priority,
            backoff_exponent: 0,
            do_not_cache,
            message_ack,
            packet_id,
        });
        Ok(())
    }

    /// `queue_iter_{start,next}`: indices of entries eligible for
    /// transmission in cycle `c`, i.e. `c mod 2^backoff_exponent == 0`.
    pub fn eligible(&self, cycle: u64) -> Vec<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| cycle % (1u64 << e.backoff_exponent) == 0)
            .map(|(i, _)| i)
            .collect()
    }

    /// `queue_iter_inc_backoff` plus the post-transmission removal rule:
    /// if `DO_NOT_CACHE` was set, the entry is removed after its one
    /// transmission; otherwise its backoff exponent increments, and the
    /// entry is dropped once that reaches [`MAX_BACKOFF_EXPONENT`].
    pub fn on_transmitted(&mut self, index: usize) -> Result<(), AbcError> {
        let entry = self.entries.get_mut(index).ok_or(AbcError::UnknownEntry)?;
        if entry.do_not_cache {
            self.remove_at(index);
            return Ok(());
        }
        entry.backoff_exponent += 1;
        if entry.backoff_exponent >= MAX_BACKOFF_EXPONENT {
            self.remove_at(index);
        }
        Ok(())
    }

    /// `queue_iter_remove`.
    pub fn remove_at(&mut self, index: usize) {
        if index < self.entries.len() {
            let removed = self.entries.remove(index);
            self.total_bytes -= removed.bytes.len();
        }
    }

    /// Removes every entry whose message id or packet id matches one of
    /// the inbound ack packet's carried values (spec §4.8: "remove every
    /// queue entry whose SHA-512(stored_message_ack) matches either the
    /// entry's message_id or packet_id").
    pub fn evict_acked(&mut self, acked: &[[u8; 16]]) {
        let hashed: Vec<[u8; 16]> = acked.iter().map(id_hash).collect();
        let total_bytes = &mut self.total_bytes;
        self.entries.retain(|e| {
            let acked_match = hashed
                .iter()
                .any(|h| *h == e.message_id() || *h == e.packet_id_hash());
            if acked_match {
                *total_bytes -= e.bytes.len();
            }
            !acked_match
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use allnet_proto::priority::DEFAULT;

    fn entry_with_ack(ack: [u8; 16]) -> ([u8; 16], [u8; 16]) {
        (ack, [0xaa; 16])
    }

    #[test]
    fn add_and_evict_by_message_ack() {
        let mut q = TransmitQueue::new();
        let (ack, pid) = entry_with_ack([1u8; 16]);
        q.add(vec![1, 2, 3], DEFAULT, false, ack, pid).unwrap();
        assert_eq!(q.len(), 1);

        q.evict_acked(&[ack]);
        assert!(q.is_empty());
    }

    #[test]
    fn evict_matches_packet_id_too() {
        let mut q = TransmitQueue::new();
        let (ack, pid) = entry_with_ack([2u8; 16]);
        q.add(vec![9], DEFAULT, false, ack, pid).unwrap();

        q.evict_acked(&[pid]);
        assert!(q.is_empty());
    }

    #[test]
    fn backoff_eligibility_follows_power_of_two_schedule() {
        let mut q = TransmitQueue::new();
        let (ack, pid) = entry_with_ack([3u8; 16]);
        q.add(vec![1], DEFAULT, false, ack, pid).unwrap();

        // backoff_exponent starts at 0: eligible every cycle.
        assert_eq!(q.eligible(0), vec![0]);
        assert_eq!(q.eligible(1), vec![0]);

        q.on_transmitted(0).unwrap(); // now exponent 1: eligible every 2 cycles
        assert_eq!(q.eligible(0), vec![0]);
        assert!(q.eligible(1).is_empty());
        assert_eq!(q.eligible(2), vec![0]);
    }

    #[test]
    fn entry_is_dropped_once_backoff_reaches_max() {
        let mut q = TransmitQueue::new();
        let (ack, pid) = entry_with_ack([4u8; 16]);
        q.add(vec![1], DEFAULT, false, ack, pid).unwrap();

        for _ in 0..8 {
            q.on_transmitted(0).unwrap();
        }
        assert!(q.is_empty());
    }

    #[test]
    fn do_not_cache_entry_is_removed_after_one_transmission() {
        let mut q = TransmitQueue::new();
        let (ack, pid) = entry_with_ack([5u8; 16]);
        q.add(vec![1], DEFAULT, true, ack, pid).unwrap();

        q.on_transmitted(0).unwrap();
        assert!(q.is_empty());
    }

    #[test]
    fn queue_rejects_additions_past_the_byte_bound() {
        let mut q = TransmitQueue::new();
        let big = vec![0u8; crate::constants::QUEUE_MAX_BYTES];
        let (ack, pid) = entry_with_ack([6u8; 16]);
        q.add(big, DEFAULT, false, ack, pid).unwrap();

        let (ack2, pid2) = entry_with_ack([7u8; 16]);
        let result = q.add(vec![1], DEFAULT, false, ack2, pid2);
        assert!(matches!(result, Err(AbcError::QueueFull)));
    }
}
