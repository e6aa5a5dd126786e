//! Key-request responder (spec §1/§2 component table: "key-request
//! responder ~3%, broadcast-key distribution"): answers an inbound
//! [`KeyRequest`](allnet_proto::KeyRequest) naming an AHRA with our
//! matching broadcast public key, if we publish one under that address.
//!
//! This is distinct from the encrypted-reply path the key-request wire
//! layout also carries (`reply_pubkey`, spec §9): the original source
//! disables that path (`#if 0`), so it stays unimplemented here too — a
//! matching key is always sent back as plain DER bytes.

use allnet_proto::{KeyRequest, KeyRequestReply};
use pkcs8::EncodePublicKey;

use crate::bc_keys::BcKeyStore;
use crate::error::StoreError;

/// Looks up `request.ahra` among our published broadcast keys and, if
/// found, returns a reply carrying that key's DER-encoded public half.
/// Returns a reply with an empty key (spec §7: silent "no match" rather
/// than an error) when we don't publish a broadcast key under that
/// address — a corrupt on-disk key is likewise treated as "no match"
/// rather than surfaced as an error (spec §7 `StoreCorruption`: skip and
/// continue).
pub fn respond_to_key_request(
    store: &BcKeyStore,
    request: &KeyRequest,
) -> Result<KeyRequestReply, StoreError> {
    let pubkey = match store.load_own(&request.ahra) {
        Ok(priv_key) => {
            let pub_key = rsa::RsaPublicKey::from(&priv_key);
            pub_key
                .to_public_key_der()
                .map(|der| der.as_bytes().to_vec())
                .unwrap_or_default()
        }
        Err(_) => Vec::new(),
    };
    Ok(KeyRequestReply { pubkey })
}
