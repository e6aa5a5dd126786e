//! Optional encryption of trace replies under the requester's public key
//! (spec §4.9: a trace request may carry "an optional RSA public key for
//! encrypted replies"). This is unrelated to the key-request protocol's
//! own disabled encrypted-reply path (spec §9 open question 3, which
//! stays out of scope); trace's own field is a normal part of this
//! subsystem's wire layout and is acted upon here.

use allnet_crypto::RsaPublicKey;
use pkcs8::DecodePublicKey;
use rand::{CryptoRng, RngCore};

use crate::error::TraceError;

/// Encrypts `reply_bytes` (an encoded [`allnet_proto::TraceReply`]) under
/// `requester_pubkey_der` if non-empty, otherwise returns it unchanged.
/// `requester_pubkey_der` is the raw bytes carried on the originating
/// [`allnet_proto::TraceRequest`]'s `pubkey` field, expected to be a
/// DER-encoded SubjectPublicKeyInfo.
pub fn encrypt_reply_if_requested<R: RngCore + CryptoRng>(
    rng: &mut R,
    reply_bytes: &[u8],
    requester_pubkey_der: &[u8],
) -> Result<Vec<u8>, TraceError> {
    if requester_pubkey_der.is_empty() {
        return Ok(reply_bytes.to_vec());
    }
    let pubkey = RsaPublicKey::from_public_key_der(requester_pubkey_der)
        .map_err(|_| TraceError::Proto(allnet_proto::ProtoError::MalformedPacket {
            need: 1,
            got: 0,
        }))?;
    Ok(allnet_crypto::encrypt(rng, reply_bytes, &pubkey)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use allnet_crypto::RsaPrivateKey;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn no_pubkey_passes_through_unencrypted() {
        let mut rng = StdRng::seed_from_u64(1);
        let bytes = b"plain reply".to_vec();
        let out = encrypt_reply_if_requested(&mut rng, &bytes, &[]).unwrap();
        assert_eq!(out, bytes);
    }

    #[test]
    fn pubkey_present_encrypts_and_decrypts_back() {
        use pkcs8::EncodePublicKey;
        let mut rng = StdRng::seed_from_u64(2);
        let priv_key = RsaPrivateKey::new(&mut rng, 1024).unwrap();
        let pub_key = RsaPublicKey::from(&priv_key);
        let der = pub_key.to_public_key_der().unwrap();

        let reply = b"a secret trace reply".to_vec();
        let ct = encrypt_reply_if_requested(&mut rng, &reply, der.as_bytes()).unwrap();
        assert_ne!(ct, reply);

        let pt = allnet_crypto::decrypt(&ct, &priv_key).unwrap();
        assert_eq!(pt, reply);
    }
}
