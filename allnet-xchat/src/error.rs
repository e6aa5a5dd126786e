use thiserror::Error;

/// Failures surfaced by the xchat reliability layer (spec §4.10).
#[derive(Debug, Error)]
pub enum XchatError {
    #[error("malformed xchat wire data: {0}")]
    Proto(#[from] allnet_proto::ProtoError),
    #[error("no keyset known for this contact")]
    NoKeyset,
}
