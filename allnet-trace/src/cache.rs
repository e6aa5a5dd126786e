//! Responder-side loop-suppression cache (spec §4.9): a 100-entry ring
//! remembering recently seen `trace_id`s. An exact match means "drop
//! silently, we've already forwarded this one" (spec invariant 6,
//! scenario D).

const CACHE_SIZE: usize = 100;

pub struct TraceCache {
    seen: [Option<[u8; 16]>; CACHE_SIZE],
    next: usize,
}

impl Default for TraceCache {
    fn default() -> Self {
        Self::new()
    }
}

impl TraceCache {
    pub fn new() -> Self {
        Self {
            seen: [None; CACHE_SIZE],
            next: 0,
        }
    }

    pub fn contains(&self, trace_id: &[u8; 16]) -> bool {
        self.seen.iter().any(|slot| slot.as_ref() == Some(trace_id))
    }

    /// Inserts `trace_id`, evicting the oldest entry once the ring is
    /// full. Idempotent in effect (re-inserting an already-seen id still
    /// counts as "seen" via [`contains`]).
    pub fn insert(&mut self, trace_id: [u8; 16]) {
        self.seen[self.next] = Some(trace_id);
        self.next = (self.next + 1) % CACHE_SIZE;
    }

    /// Checks for `trace_id` and inserts it in one step, returning
    /// whether it was already present (i.e. this request is a duplicate
    /// and must be dropped).
    pub fn check_and_insert(&mut self, trace_id: [u8; 16]) -> bool {
        let was_seen = self.contains(&trace_id);
        self.insert(trace_id);
        was_seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sighting_is_new_second_is_duplicate() {
        let mut cache = TraceCache::new();
        let id = [1u8; 16];
        assert!(!cache.check_and_insert(id));
        assert!(cache.check_and_insert(id));
    }

    #[test]
    fn distinct_ids_are_independent() {
        let mut cache = TraceCache::new();
        assert!(!cache.check_and_insert([1u8; 16]));
        assert!(!cache.check_and_insert([2u8; 16]));
    }

    #[test]
    fn ring_eventually_forgets_the_oldest_entry() {
        let mut cache = TraceCache::new();
        let target = [9u8; 16];
        cache.insert(target);
        for i in 0..CACHE_SIZE as u32 {
            cache.insert(i.to_be_bytes().try_into().map(|b: [u8; 4]| {
                let mut full = [0u8; 16];
                full[..4].copy_from_slice(&b);
                full
            }).unwrap());
        }
        assert!(!cache.contains(&target));
    }
}
