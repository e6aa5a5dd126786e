//! The xchat reliability layer (spec §4.10): sequence-numbered chat
//! messages layered over the unreliable overlay, with gap detection
//! ([`missing`]), retransmit-request construction ([`pull`]), and
//! resend scheduling with history-based dedup ([`push`],
//! [`resend_history`]).

pub mod error;
pub mod missing;
pub mod pull;
pub mod push;
pub mod resend_history;

pub use error::XchatError;
pub use missing::{get_missing, get_prev};
pub use pull::build_retransmit_request;
pub use push::{resend_priorities, sequence_numbers_to_resend, MAX_RESEND_PER_REQUEST};
pub use resend_history::{ResendHistory, RESEND_WINDOW_SECS, RING_SIZE};
