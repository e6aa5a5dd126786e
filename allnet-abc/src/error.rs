use thiserror::Error;

/// Failures surfaced by the `abc` broadcast-channel state machine (spec
/// §7). Malformed inbound packets and `sendto` transience are handled by
/// the caller (the event loop); this crate only reports what it itself
/// cannot recover from.
#[derive(Debug, Error)]
pub enum AbcError {
    #[error("transmit queue is full")]
    QueueFull,
    #[error("unknown queue entry")]
    UnknownEntry,
}
