use thiserror::Error;

/// Crypto failures never leak which step failed (spec §7): every public
/// fallible operation collapses to one of these coarse variants, and
/// callers treat any of them as "drop the packet, say nothing".
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("encryption failed")]
    EncryptFailure,
    #[error("decryption failed")]
    DecryptFailure,
    #[error("signing failed")]
    SignFailure,
    #[error("stream authentication failed")]
    AuthFailure,
    #[error("invalid stream cipher parameters")]
    InvalidStreamParams,
}
