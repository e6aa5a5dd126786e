//! The `abc` broadcast-channel medium-access state machine (spec
//! §3/§4.8/§9): beacon handshake FSM, bounded priority transmit queue,
//! and the managed/unmanaged cycle scheduler that ties them together.
//!
//! Everything here is socket-free and deterministic given its inputs, per
//! spec §9's redesign note: the original's file-scope statics
//! (`beacon_state`, nonces, `cycle`, `high_priority`) are bundled into
//! [`beacon::BroadcastChannel`], whose event-handler methods make the FSM
//! unit-testable without a Wi-Fi driver. Actually driving a socket/`iw`
//! and turning an interface on or off is the invocation shell's job
//! (spec §1, out of scope); this crate only decides *what* to do and
//! *when*.

pub mod beacon;
pub mod cancel;
pub mod constants;
pub mod error;
pub mod queue;
pub mod schedule;

pub use beacon::{reply_delay_ms, BeaconState, BroadcastChannel, Nonces};
pub use cancel::CancelToken;
pub use error::AbcError;
pub use queue::{QueueEntry, TransmitQueue};
pub use schedule::{CycleMode, CyclePlan, InterfacePowerTracker};
