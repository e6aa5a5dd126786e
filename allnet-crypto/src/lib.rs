//! Cryptographic primitives for AllNet: the hybrid RSA/AES-CTR envelope
//! used for one-shot message encryption and signing (spec §4.5), and the
//! stateful authenticated AES stream cipher used for xchat sessions
//! (spec §4.6).

pub mod envelope;
pub mod error;
pub mod stream;

pub use error::CryptoError;
pub use envelope::{
    decrypt, decrypt_verify, encrypt, sign, verify, DecryptVerifyCandidate, DecryptVerifyResult,
};
pub use stream::{StreamSecret, StreamState};

pub use rsa::{RsaPrivateKey, RsaPublicKey};
