//! Two-table rotating-hash packet dedup (spec §3/§4.3), grounded on
//! `original_source/record.c`. Two 1024-slot tables are indexed by
//! different byte-permutations of the same 32-bit hash; a lookup hits if
//! either table's slot holds a matching hash, but every insert always
//! overwrites both slots regardless of whether they already held a
//! different hash. That overwrite-on-collision is deliberate: under
//! memory pressure a packet survives in whichever table a later
//! collision happens not to evict it from (spec §9's documented
//! trade-off, Scenario A).

const ENTRIES_PER_TABLE: usize = 1024;

#[derive(Clone, Copy)]
struct Entry {
    hash: u32,
    last_seen: u64,
    connection: i32,
}

impl Entry {
    const EMPTY: Entry = Entry {
        hash: 0,
        last_seen: 0,
        connection: -1,
    };
}

pub struct DedupTable {
    table1: [Entry; ENTRIES_PER_TABLE],
    table2: [Entry; ENTRIES_PER_TABLE],
}

impl Default for DedupTable {
    fn default() -> Self {
        Self::new()
    }
}

impl DedupTable {
    pub fn new() -> Self {
        Self {
            table1: [Entry::EMPTY; ENTRIES_PER_TABLE],
            table2: [Entry::EMPTY; ENTRIES_PER_TABLE],
        }
    }

    /// `my_hash_fn` in `record.c`: XOR-and-rotate over the packet's 32-bit
    /// words, folded with any trailing partial word and the bit length,
    /// then forced non-negative. Reimplemented here over bytes rather
    /// than `int*` aliasing, since that aliasing is undefined behavior in
    /// Rust (and arguably already was in the original C).
    fn hash(data: &[u8]) -> u32 {
        let bits = (data.len() as u32) * 8;
        let whole_words = data.len() / 4;

        let mut result: u32 = 0;
        let tail = &data[whole_words * 4..];
        for (i, &b) in tail.iter().enumerate() {
            result |= (b as u32) << (8 * i);
        }
        result = result.wrapping_add(bits);

        for i in 0..whole_words {
            let word = u32::from_le_bytes(data[i * 4..i * 4 + 4].try_into().unwrap());
            result = result.rotate_left(1);
            result ^= word;
        }
        result & 0x7fff_ffff
    }

    fn indices(hash: u32) -> (usize, usize) {
        let left_hash = ((hash >> 16) & 0xff00) | ((hash >> 8) & 0xff);
        let right_hash = ((hash >> 8) & 0xff00) | (hash & 0xff);
        (
            (left_hash as usize) % ENTRIES_PER_TABLE,
            (right_hash as usize) % ENTRIES_PER_TABLE,
        )
    }

    fn get_hash_time(entry: &Entry, hash: u32, now: u64) -> u64 {
        if entry.hash != hash || entry.last_seen == 0 {
            return 0;
        }
        let delta = now.saturating_sub(entry.last_seen);
        if delta == 0 {
            1
        } else {
            delta
        }
    }

    /// Returns 0 if `data` is new, or the number of time units (at least
    /// 1) since it was last recorded on either table. Always inserts
    /// `data` into both tables afterward, tagged with `connection`.
    pub fn record_packet_time(&mut self, data: &[u8], connection: i32, now: u64) -> u64 {
        let hash = Self::hash(data);
        let (left_index, right_index) = Self::indices(hash);

        let left_time = Self::get_hash_time(&self.table1[left_index], hash, now);
        let right_time = Self::get_hash_time(&self.table2[right_index], hash, now);

        self.table1[left_index] = Entry {
            hash,
            last_seen: now,
            connection,
        };
        self.table2[right_index] = Entry {
            hash,
            last_seen: now,
            connection,
        };

        if left_time == 0 {
            right_time
        } else if right_time == 0 {
            left_time
        } else {
            left_time.min(right_time)
        }
    }

    #[cfg(test)]
    fn slot_still_holds(&self, data: &[u8]) -> (bool, bool) {
        let hash = Self::hash(data);
        let (left_index, right_index) = Self::indices(hash);
        (
            self.table1[left_index].hash == hash && self.table1[left_index].last_seen != 0,
            self.table2[right_index].hash == hash && self.table2[right_index].last_seen != 0,
        )
    }

    /// Zeros every slot (in both tables) tagged with `connection`.
    pub fn record_packet_clear(&mut self, connection: i32) {
        for entry in self.table1.iter_mut() {
            if entry.connection == connection {
                *entry = Entry::EMPTY;
            }
        }
        for entry in self.table2.iter_mut() {
            if entry.connection == connection {
                *entry = Entry::EMPTY;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sighting_is_unseen_second_is_seen() {
        let mut table = DedupTable::new();
        let packet: Vec<u8> = (0u16..=0xff).map(|b| b as u8).collect();

        assert_eq!(table.record_packet_time(&packet, 0, 100), 0);
        assert!(table.record_packet_time(&packet, 0, 101) >= 1);
    }

    #[test]
    fn table_capacity_eventually_evicts_old_entries() {
        let mut table = DedupTable::new();
        let target: Vec<u8> = vec![0xaa; 64];
        assert_eq!(table.record_packet_time(&target, 0, 0), 0);

        for i in 0..2049u32 {
            let packet = i.to_be_bytes().to_vec();
            table.record_packet_time(&packet, 0, 1);
        }

        // 2,049 distinct insertions into two 1024-slot tables must have
        // overwritten at least one of target's two original slots.
        let (left_survives, right_survives) = table.slot_still_holds(&target);
        assert!(!left_survives || !right_survives);
    }

    #[test]
    fn record_packet_clear_zeros_matching_connection_only() {
        let mut table = DedupTable::new();
        let a = b"packet a".to_vec();
        let b = b"packet b".to_vec();
        table.record_packet_time(&a, 1, 10);
        table.record_packet_time(&b, 2, 10);

        table.record_packet_clear(1);

        assert_eq!(table.record_packet_time(&a, 1, 11), 0);
        assert!(table.record_packet_time(&b, 2, 11) >= 1);
    }
}
