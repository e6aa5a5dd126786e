//! PEM encode/decode helpers shared by the spare-key pool and keyset store.

use pkcs8::{DecodePrivateKey, EncodePrivateKey, DecodePublicKey, EncodePublicKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};

use crate::error::StoreError;

pub fn write_private_key(key: &RsaPrivateKey) -> Result<String, StoreError> {
    key.to_pkcs8_pem(LineEnding::LF)
        .map(|pem| pem.to_string())
        .map_err(|_| StoreError::MalformedKey)
}

pub fn read_private_key(pem: &str) -> Result<RsaPrivateKey, StoreError> {
    RsaPrivateKey::from_pkcs8_pem(pem).map_err(|_| StoreError::MalformedKey)
}

pub fn write_public_key(key: &RsaPublicKey) -> Result<String, StoreError> {
    key.to_public_key_pem(LineEnding::LF)
        .map_err(|_| StoreError::MalformedKey)
}

pub fn read_public_key(pem: &str) -> Result<RsaPublicKey, StoreError> {
    RsaPublicKey::from_public_key_pem(pem).map_err(|_| StoreError::MalformedKey)
}
