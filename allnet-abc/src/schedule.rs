//! Per-cycle scheduling decisions that sit above the beacon FSM (spec
//! §4.8): picking the random beacon instant within the 5s cycle, tracking
//! how long the interface took to power up (so that startup cost is
//! amortized out of the next cycles' idle budget rather than repeated),
//! and the managed/unmanaged high-low mode decision for whether the
//! interface should be powered off once the beacon window closes.
//!
//! Actually toggling a real interface is the invocation shell's job
//! (spec §1); this module only computes what a shell driving `abc` would
//! need to do.

use rand::RngCore;

use crate::constants::{BASIC_CYCLE_MS, BEACON_MS};
use crate::queue::TransmitQueue;

/// High iff a high-priority packet arrived this cycle or the queue's
/// max-priority entry is at least `FRIENDS_LOW` (spec §4.8); see
/// [`crate::beacon::BroadcastChannel::is_high_priority_mode`] for the
/// actual computation. This enum just names the two resulting schedules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleMode {
    High,
    Low,
}

impl CycleMode {
    pub fn from_high_priority(is_high: bool) -> Self {
        if is_high {
            CycleMode::High
        } else {
            CycleMode::Low
        }
    }

    pub fn is_high(self) -> bool {
        matches!(self, CycleMode::High)
    }
}

/// The decisions made once at the start of a managed-mode cycle: when
/// within the cycle to transmit our own beacon, and which mode governs
/// whether the interface powers off afterward.
#[derive(Debug, Clone, Copy)]
pub struct CyclePlan {
    pub beacon_offset_ms: u64,
    pub mode: CycleMode,
}

impl CyclePlan {
    /// Picks a uniformly random beacon instant in `[0, BASIC_CYCLE_MS -
    /// BEACON_MS]` (spec §4.8 step 2: "pick a random sub-interval of
    /// length BEACON_MS within the 5s").
    pub fn new<R: RngCore>(rng: &mut R, mode: CycleMode) -> Self {
        let span = BASIC_CYCLE_MS - BEACON_MS + 1;
        let beacon_offset_ms = rng.next_u64() % span;
        Self {
            beacon_offset_ms,
            mode,
        }
    }

    /// Whether the interface should be powered off for the remainder of
    /// the cycle once the beacon window has closed. High mode always
    /// keeps the interface on; low mode powers off unless a grant is
    /// still pending (spec §4.8 step 6).
    pub fn should_power_off(&self, grant_pending: bool) -> bool {
        matches!(self.mode, CycleMode::Low) && !grant_pending
    }
}

/// Tracks the cost of bringing a powered-off interface back up, so that
/// a driver shell can subtract the cycles spent waiting from the next
/// cycle's idle budget instead of re-charging it every time (spec §4.8
/// step 1).
#[derive(Debug, Default)]
pub struct InterfacePowerTracker {
    on: bool,
    startup_debt_cycles: u32,
}

impl InterfacePowerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_on(&self) -> bool {
        self.on && self.startup_debt_cycles == 0
    }

    /// Called once per cycle with whether this cycle wants the interface
    /// on, and (only meaningful on the transition from off to on) how
    /// many cycles the driver is expected to take to come up. Returns
    /// whether the interface is actually usable this cycle: `false`
    /// while startup debt remains, even if `want_on` is true.
    pub fn begin_cycle(&mut self, want_on: bool, startup_cycles: u32) -> bool {
        if want_on && !self.on {
            self.on = true;
            self.startup_debt_cycles = startup_cycles;
        } else if !want_on {
            self.on = false;
            self.startup_debt_cycles = 0;
        }
        if self.startup_debt_cycles > 0 {
            self.startup_debt_cycles -= 1;
            false
        } else {
            self.on
        }
    }
}

/// Unmanaged-mode sending (spec §4.8): "each cycle, broadcast all
/// eligible queue entries once" — no beacon handshake, just the usual
/// backoff-eligibility scan. Named separately from
/// [`TransmitQueue::eligible`] so a caller driving the unmanaged-mode
/// loop has a name that matches the spec prose.
pub fn unmanaged_cycle_sends(queue: &TransmitQueue, cycle: u64) -> Vec<usize> {
    queue.eligible(cycle)
}
