use thiserror::Error;

/// Errors raised while decoding or encoding AllNet wire structures.
///
/// These map onto the `Malformed` branch of the error taxonomy in the
/// overall design: short buffers, unknown versions, and address bit counts
/// out of range are all silently-droppable by callers that receive packets
/// off the wire, but are returned as errors here so the caller decides.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtoError {
    #[error("buffer too short: need at least {need} bytes, got {got}")]
    MalformedPacket { need: usize, got: usize },
    #[error("unsupported protocol version {0}")]
    UnsupportedVersion(u8),
    #[error("invalid address bit count {0} (must be 0..=64)")]
    MalformedAddress(u8),
    #[error("unknown message type {0}")]
    UnknownMessageType(u8),
    #[error("unknown management type {0}")]
    UnknownMgmtType(u8),
    #[error("unknown signature algorithm {0}")]
    UnknownSigAlgo(u8),
    #[error("declared length {declared} does not fit remaining buffer of {remaining} bytes")]
    InconsistentLength { declared: usize, remaining: usize },
}
