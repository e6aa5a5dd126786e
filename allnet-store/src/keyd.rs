//! Background spare-key pool maintenance (spec §4.7/§5): `keyd_generate`
//! keeps up to [`MAX_SPARE_KEYS`] unassigned keys on hand so
//! `create_contact` rarely blocks on key generation, throttled so a slow
//! or busy host doesn't spend all its entropy generating keys nobody asked
//! for yet.
//!
//! The actual "spawn a nice(15) child process and sleep" behavior (spec
//! §5) is the invocation shell's job; this module is the pure scheduling
//! decision a shell driving that loop would consult, expressed over
//! explicit millisecond timestamps rather than a real clock so it's
//! testable without sleeping (mirrors `allnet_abc::schedule`'s
//! `CyclePlan`/`InterfacePowerTracker` style).

use rand::{CryptoRng, RngCore};

use crate::error::StoreError;
use crate::spare::SparePool;

/// The pool is never grown past this many unassigned keys (spec §4.7).
pub const MAX_SPARE_KEYS: usize = 100;

/// Never generate more than one key faster than this, regardless of how
/// quickly the last one finished (spec §5: "minimum 10 min").
pub const MIN_INTERVAL_MS: u64 = 10 * 60 * 1000;

/// Tracks how long the last key took to generate and when it was
/// produced, so the next generation can be throttled to
/// `max(100 * last_duration, MIN_INTERVAL_MS)` after it (spec §5: "sleeping
/// for 100x the generation interval, minimum 10 min").
#[derive(Debug, Clone, Copy)]
pub struct SpareKeyScheduler {
    last_duration_ms: u64,
    next_allowed_ms: u64,
}

impl Default for SpareKeyScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl SpareKeyScheduler {
    pub fn new() -> Self {
        Self {
            last_duration_ms: 0,
            next_allowed_ms: 0,
        }
    }

    pub fn next_allowed_ms(&self) -> u64 {
        self.next_allowed_ms
    }

    pub fn is_ready(&self, now_ms: u64) -> bool {
        now_ms >= self.next_allowed_ms
    }

    /// Records that a generation just completed at `now_ms`, having taken
    /// `duration_ms`, and schedules the earliest next attempt.
    pub fn record_generation(&mut self, now_ms: u64, duration_ms: u64) {
        self.last_duration_ms = duration_ms;
        let wait = duration_ms.saturating_mul(100).max(MIN_INTERVAL_MS);
        self.next_allowed_ms = now_ms.saturating_add(wait);
    }
}

/// One maintenance tick: generates a fresh spare key of `bits` size if the
/// pool has room and the scheduler's throttle has elapsed. Returns whether
/// a key was generated. `duration_ms` is the caller's measurement of how
/// long this generation took (fed back into the scheduler for next time).
pub fn maintain_pool<R: RngCore + CryptoRng>(
    pool: &SparePool,
    scheduler: &mut SpareKeyScheduler,
    rng: &mut R,
    bits: usize,
    now_ms: u64,
    timestamp: u64,
    duration_ms: u64,
) -> Result<bool, StoreError> {
    if pool.len()? >= MAX_SPARE_KEYS {
        return Ok(false);
    }
    if !scheduler.is_ready(now_ms) {
        return Ok(false);
    }
    pool.generate(rng, bits, timestamp)?;
    scheduler.record_generation(now_ms, duration_ms);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn first_tick_is_always_ready() {
        let scheduler = SpareKeyScheduler::new();
        assert!(scheduler.is_ready(0));
    }

    #[test]
    fn throttles_to_at_least_the_floor() {
        let mut scheduler = SpareKeyScheduler::new();
        scheduler.record_generation(1_000, 1); // a near-instant generation
        assert_eq!(scheduler.next_allowed_ms(), 1_000 + MIN_INTERVAL_MS);
    }

    #[test]
    fn slow_generation_scales_the_wait() {
        let mut scheduler = SpareKeyScheduler::new();
        let duration = MIN_INTERVAL_MS; // slower than the floor implies
        scheduler.record_generation(0, duration);
        assert_eq!(scheduler.next_allowed_ms(), duration * 100);
    }

    #[test]
    fn maintain_pool_stops_at_the_cap() {
        let dir = tempfile::tempdir().unwrap();
        let pool = SparePool::open(dir.path()).unwrap();
        let mut rng = StdRng::seed_from_u64(1);

        for i in 0..MAX_SPARE_KEYS {
            pool.generate(&mut rng, 512, i as u64).unwrap();
        }
        assert_eq!(pool.len().unwrap(), MAX_SPARE_KEYS);

        let mut scheduler = SpareKeyScheduler::new();
        let made = maintain_pool(&pool, &mut scheduler, &mut rng, 512, 0, 999, 0).unwrap();
        assert!(!made);
        assert_eq!(pool.len().unwrap(), MAX_SPARE_KEYS);
    }

    #[test]
    fn maintain_pool_generates_once_then_waits() {
        let dir = tempfile::tempdir().unwrap();
        let pool = SparePool::open(dir.path()).unwrap();
        let mut rng = StdRng::seed_from_u64(2);
        let mut scheduler = SpareKeyScheduler::new();

        assert!(maintain_pool(&pool, &mut scheduler, &mut rng, 512, 0, 0, 0).unwrap());
        assert_eq!(pool.len().unwrap(), 1);
        assert!(!maintain_pool(&pool, &mut scheduler, &mut rng, 512, 1, 1, 0).unwrap());
        assert_eq!(pool.len().unwrap(), 1);
        assert!(maintain_pool(
            &pool,
            &mut scheduler,
            &mut rng,
            512,
            MIN_INTERVAL_MS,
            2,
            0
        )
        .unwrap());
        assert_eq!(pool.len().unwrap(), 2);
    }
}
