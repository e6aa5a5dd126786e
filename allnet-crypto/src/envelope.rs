//! Hybrid RSA/AES-CTR envelope encryption and PKCS#1 v1.5 sign/verify
//! (spec §4.5).
//!
//! For messages that fit in a single RSA-OAEP block, `encrypt` is a direct
//! OAEP encryption. Larger messages fall back to a hybrid scheme: a fresh
//! AES-256 key and 16-byte counter are generated, prepended to the
//! plaintext, and the first `R - 42` bytes of that combined buffer are
//! RSA-OAEP encrypted; the remainder is AES-256-CTR encrypted under the
//! embedded key, with the embedded bytes serving as the initial counter.

use aes::Aes256;
use ctr::cipher::{KeyIvInit, StreamCipher};
use rand::{CryptoRng, RngCore};
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha1::Sha1;
use sha2::{Digest, Sha512};

use crate::error::CryptoError;

type Aes256Ctr = ctr::Ctr128BE<Aes256>;

/// RSA-OAEP (with SHA-1, giving the 42-byte PKCS#1 v2 overhead the spec
/// assumes) padding overhead in bytes.
const OAEP_OVERHEAD: usize = 42;
const AES_KEY_SIZE: usize = 32;
const AES_NONCE_SIZE: usize = 16;
const SHA512_SIZE: usize = 64;

fn oaep() -> Oaep {
    Oaep::new::<Sha1>()
}

/// Encrypts `plaintext` for `pubkey`. See module docs for the hybrid
/// scheme; round-trips with [`decrypt`] for any plaintext length
/// (spec invariant 1).
pub fn encrypt<R: RngCore + CryptoRng>(
    rng: &mut R,
    plaintext: &[u8],
    pubkey: &RsaPublicKey,
) -> Result<Vec<u8>, CryptoError> {
    let rsa_size = pubkey.size();
    let max_rsa = rsa_size.saturating_sub(OAEP_OVERHEAD);

    if plaintext.len() <= max_rsa {
        return pubkey
            .encrypt(rng, oaep(), plaintext)
            .map_err(|_| CryptoError::EncryptFailure);
    }

    let mut key = [0u8; AES_KEY_SIZE];
    let mut nonce = [0u8; AES_NONCE_SIZE];
    rng.fill_bytes(&mut key);
    rng.fill_bytes(&mut nonce);

    let mut message = Vec::with_capacity(AES_KEY_SIZE + AES_NONCE_SIZE + plaintext.len());
    message.extend_from_slice(&key);
    message.extend_from_slice(&nonce);
    message.extend_from_slice(plaintext);

    let (rsa_chunk, aes_chunk) = message.split_at(max_rsa);

    let mut result = pubkey
        .encrypt(rng, oaep(), rsa_chunk)
        .map_err(|_| CryptoError::EncryptFailure)?;

    let mut cipher = Aes256Ctr::new((&key).into(), (&nonce).into());
    let mut tail = aes_chunk.to_vec();
    cipher.apply_keystream(&mut tail);
    result.extend_from_slice(&tail);
    Ok(result)
}

/// Decrypts `ciphertext` with `privkey`. Any RSA failure or length
/// inconsistency collapses to [`CryptoError::DecryptFailure`] without
/// revealing which step failed.
pub fn decrypt(ciphertext: &[u8], privkey: &RsaPrivateKey) -> Result<Vec<u8>, CryptoError> {
    let rsa_size = privkey.size();
    if ciphertext.len() < rsa_size {
        return Err(CryptoError::DecryptFailure);
    }
    let (rsa_part, aes_part) = ciphertext.split_at(rsa_size);

    let rsa_plain = privkey
        .decrypt(oaep(), rsa_part)
        .map_err(|_| CryptoError::DecryptFailure)?;

    if aes_part.is_empty() {
        return Ok(rsa_plain);
    }

    if rsa_plain.len() < AES_KEY_SIZE + AES_NONCE_SIZE {
        return Err(CryptoError::DecryptFailure);
    }
    let key = &rsa_plain[..AES_KEY_SIZE];
    let nonce = &rsa_plain[AES_KEY_SIZE..AES_KEY_SIZE + AES_NONCE_SIZE];
    let rsa_plaintext_tail = &rsa_plain[AES_KEY_SIZE + AES_NONCE_SIZE..];

    let mut cipher = Aes256Ctr::new(key.into(), nonce.into());
    let mut aes_plain = aes_part.to_vec();
    cipher.apply_keystream(&mut aes_plain);

    let mut out = Vec::with_capacity(rsa_plaintext_tail.len() + aes_plain.len());
    out.extend_from_slice(rsa_plaintext_tail);
    out.extend_from_slice(&aes_plain);
    Ok(out)
}

/// Hashes `message` with SHA-512, truncated to `min(rsa_size - 42, 64)`
/// bytes, the digest actually signed/verified (spec §4.5).
fn sign_hash(message: &[u8], rsa_size: usize) -> Vec<u8> {
    let hsize = (rsa_size.saturating_sub(OAEP_OVERHEAD)).min(SHA512_SIZE);
    let mut hasher = Sha512::new();
    hasher.update(message);
    let digest = hasher.finalize();
    digest[..hsize].to_vec()
}

/// Signs `message` via RSA-PKCS#1 v1.5 over the (possibly truncated)
/// SHA-512 hash described in [`sign_hash`].
pub fn sign(message: &[u8], privkey: &RsaPrivateKey) -> Result<Vec<u8>, CryptoError> {
    let hash = sign_hash(message, privkey.size());
    privkey
        .sign(Pkcs1v15Sign::new_unprefixed(), &hash)
        .map_err(|_| CryptoError::SignFailure)
}

/// Verifies `signature` over `message` against `pubkey`.
pub fn verify(message: &[u8], signature: &[u8], pubkey: &RsaPublicKey) -> bool {
    let hash = sign_hash(message, pubkey.size());
    pubkey
        .verify(Pkcs1v15Sign::new_unprefixed(), &hash, signature)
        .is_ok()
}

/// One candidate keyset to try in [`decrypt_verify`]: an opaque identifier
/// plus the key material available for it. `pubkey` is `None` if we have
/// not yet recorded the contact's public key for this keyset.
pub struct DecryptVerifyCandidate<'a, Id> {
    pub id: Id,
    pub pubkey: Option<&'a RsaPublicKey>,
    pub privkey: &'a RsaPrivateKey,
}

/// Outcome of a successful [`decrypt_verify`] call.
pub struct DecryptVerifyResult<Id> {
    pub id: Id,
    pub plaintext: Vec<u8>,
    /// `true` if a signature was present and verified against this
    /// keyset's contact public key; `false` means "decrypted but
    /// unverified" (spec §4.5: no signature, matched by trial decryption).
    pub verified: bool,
}

/// Trial-decrypts `ciphertext` (with `signature`, if any) against each
/// candidate keyset in turn, returning the first match. Mirrors
/// `decrypt_verify` in the original source: if a signature is present,
/// only keysets whose public key verifies it are tried for decryption;
/// if absent, every keyset is tried and the first successful decryption
/// wins, marked unverified. All failures are silent — the caller simply
/// gets `None` and drops the packet (spec §7).
pub fn decrypt_verify<Id>(
    ciphertext: &[u8],
    signed_body: &[u8],
    signature: Option<&[u8]>,
    candidates: impl Iterator<Item = DecryptVerifyCandidate<'_, Id>>,
) -> Option<DecryptVerifyResult<Id>> {
    for candidate in candidates {
        let verified = match (signature, candidate.pubkey) {
            (Some(sig), Some(pubkey)) => {
                if !verify(signed_body, sig, pubkey) {
                    continue;
                }
                true
            }
            (Some(_), None) => continue,
            (None, _) => false,
        };
        if let Ok(plaintext) = decrypt(ciphertext, candidate.privkey) {
            return Some(DecryptVerifyResult {
                id: candidate.id,
                plaintext,
                verified,
            });
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn test_key(bits: usize, seed: u64) -> (RsaPrivateKey, RsaPublicKey) {
        let mut rng = StdRng::seed_from_u64(seed);
        let priv_key = RsaPrivateKey::new(&mut rng, bits).unwrap();
        let pub_key = RsaPublicKey::from(&priv_key);
        (priv_key, pub_key)
    }

    #[test]
    fn small_plaintext_round_trips() {
        let (priv_key, pub_key) = test_key(1024, 1);
        let mut rng = StdRng::seed_from_u64(2);
        let plaintext = b"hello allnet";
        let ct = encrypt(&mut rng, plaintext, &pub_key).unwrap();
        assert_eq!(ct.len(), pub_key.size());
        let pt = decrypt(&ct, &priv_key).unwrap();
        assert_eq!(pt, plaintext);
    }

    #[test]
    fn large_plaintext_round_trips() {
        let (priv_key, pub_key) = test_key(1024, 3);
        let mut rng = StdRng::seed_from_u64(4);
        let plaintext = vec![0x5au8; 500];
        let ct = encrypt(&mut rng, &plaintext, &pub_key).unwrap();
        let pt = decrypt(&ct, &priv_key).unwrap();
        assert_eq!(pt, plaintext);
    }

    #[test]
    fn sign_and_verify_round_trip() {
        let (priv_key, pub_key) = test_key(1024, 5);
        let message = b"allnet trace reply";
        let sig = sign(message, &priv_key).unwrap();
        assert!(verify(message, &sig, &pub_key));
        assert!(!verify(b"tampered", &sig, &pub_key));
    }

    #[test]
    fn decrypt_verify_finds_signed_match() {
        let (priv_a, pub_a) = test_key(1024, 6);
        let (priv_b, _pub_b) = test_key(1024, 7);
        let mut rng = StdRng::seed_from_u64(8);
        let message = b"payload for a";
        let sig = sign(message, &priv_a).unwrap();
        let ct = encrypt(&mut rng, message, &pub_a).unwrap();

        let candidates = vec![
            DecryptVerifyCandidate {
                id: "b",
                pubkey: None,
                privkey: &priv_b,
            },
            DecryptVerifyCandidate {
                id: "a",
                pubkey: Some(&pub_a),
                privkey: &priv_a,
            },
        ];
        let result = decrypt_verify(&ct, message, Some(&sig), candidates.into_iter()).unwrap();
        assert_eq!(result.id, "a");
        assert!(result.verified);
        assert_eq!(result.plaintext, message);
    }

    #[test]
    fn decrypt_verify_unsigned_is_unverified() {
        let (priv_a, pub_a) = test_key(1024, 9);
        let mut rng = StdRng::seed_from_u64(10);
        let message = b"unsigned payload";
        let ct = encrypt(&mut rng, message, &pub_a).unwrap();

        let candidates = vec![DecryptVerifyCandidate {
            id: "a",
            pubkey: Some(&pub_a),
            privkey: &priv_a,
        }];
        let result = decrypt_verify(&ct, message, None, candidates.into_iter()).unwrap();
        assert!(!result.verified);
        assert_eq!(result.plaintext, message);
    }

    #[test]
    fn decrypt_verify_no_match_returns_none() {
        let (_priv_a, pub_a) = test_key(1024, 11);
        let (priv_b, _pub_b) = test_key(1024, 12);
        let mut rng = StdRng::seed_from_u64(13);
        let message = b"for nobody in the list";
        let ct = encrypt(&mut rng, message, &pub_a).unwrap();

        let candidates = vec![DecryptVerifyCandidate {
            id: "b",
            pubkey: None,
            privkey: &priv_b,
        }];
        assert!(decrypt_verify(&ct, message, None, candidates.into_iter()).is_none());
    }
}
