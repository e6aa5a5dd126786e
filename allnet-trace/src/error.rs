use thiserror::Error;

/// Failures surfaced by the trace protocol (spec §7). Malformed requests
/// and crypto failures are both silently-droppable by the caller, per the
/// error taxonomy; this crate returns them so the caller's event loop can
/// decide whether to log at `debug!`.
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("malformed trace wire data: {0}")]
    Proto(#[from] allnet_proto::ProtoError),
    #[error("failed to encrypt reply for requested public key")]
    ReplyEncryptFailure(#[from] allnet_crypto::CryptoError),
}
