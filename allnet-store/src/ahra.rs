//! AHRA — AllNet Human-Readable Address — derivation and verification
//! (spec §3/§4.7), grounded on `original_source/src/lib/keys.c`'s
//! `make_address`/`verify_bc_key`/`parse_ahra`.
//!
//! `make_address` raw-RSA-encrypts (no padding, deliberately, so anyone
//! can redo the same encryption and get the same ciphertext) a mapped
//! form of the phrase, then searches for `bitstring_bits`-wide windows of
//! that ciphertext that exactly match successive `bitstring_bits`-wide
//! segments of `SHA-512(mapped phrase)`, counting from the end of the
//! hash backward. Each matching window's bit offset becomes one `posK` in
//! the AHRA.
//!
//! `keys.c` encodes each position as a word pair drawn from a
//! language-specific wordlist (`aaddr_encode_value`/`aaddr_decode_value`);
//! those wordlist tables are not part of this corpus, so positions are
//! encoded here as plain decimal integers instead. This is a deliberate,
//! documented simplification (see DESIGN.md) — the position-matching
//! property itself, which is what actually binds the AHRA to a key, is
//! unchanged.

use num_bigint::BigUint;
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha512};

use crate::error::StoreError;

const SHA512_SIZE: usize = 64;
const SHA512_BITS: usize = SHA512_SIZE * 8;

/// A parsed AHRA: `"<phrase>"@<pos>[.<pos>]*[,<lang>][,<bits>]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ahra {
    pub phrase: String,
    pub positions: Vec<usize>,
    pub lang: Option<String>,
    pub bitstring_bits: Option<usize>,
}

impl Ahra {
    pub fn parse(text: &str) -> Result<Self, StoreError> {
        let at = text
            .find('@')
            .ok_or_else(|| StoreError::MalformedAhra("missing '@'".into()))?;
        let phrase = text[..at].to_string();
        let rest = &text[at + 1..];

        let mut fields = rest.split(',');
        let positions_str = fields
            .next()
            .ok_or_else(|| StoreError::MalformedAhra("missing positions".into()))?;
        let positions: Result<Vec<usize>, _> = positions_str
            .split('.')
            .map(|p| p.parse::<usize>())
            .collect();
        let positions =
            positions.map_err(|_| StoreError::MalformedAhra("bad position".into()))?;

        let mut lang = None;
        let mut bitstring_bits = None;
        for field in fields {
            if field.chars().next().is_some_and(|c| c.is_ascii_digit()) {
                bitstring_bits = field.parse().ok();
            } else if !field.is_empty() {
                lang = Some(field.to_string());
            }
        }

        Ok(Self {
            phrase,
            positions,
            lang,
            bitstring_bits,
        })
    }

    pub fn format(&self) -> String {
        let positions = self
            .positions
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(".");
        let mut out = format!("{}@{}", self.phrase, positions);
        if let Some(lang) = &self.lang {
            out.push(',');
            out.push_str(lang);
        }
        if let Some(bits) = self.bitstring_bits {
            out.push(',');
            out.push_str(&bits.to_string());
        }
        out
    }

    /// `delete_lang`: the address without its language tag.
    pub fn without_lang(&self) -> Self {
        Self {
            lang: None,
            ..self.clone()
        }
    }

    /// `delete_bits`: the address without its bitstring-size tag.
    pub fn without_bits(&self) -> Self {
        Self {
            bitstring_bits: None,
            ..self.clone()
        }
    }

    /// `delete_lang_bits`: the bare phrase-and-positions form.
    pub fn canonical(&self) -> Self {
        Self {
            lang: None,
            bitstring_bits: None,
            ..self.clone()
        }
    }
}

fn mapped_phrase(phrase: &str) -> Vec<u8> {
    phrase
        .bytes()
        .filter(|b| b.is_ascii_alphanumeric())
        .map(|b| b.to_ascii_lowercase())
        .collect()
}

fn bit_at(buf: &[u8], pos: usize) -> u8 {
    (buf[pos / 8] >> (7 - (pos % 8))) & 1
}

fn bitstring_matches(a: &[u8], pos_a: usize, b: &[u8], pos_b: usize, width: usize) -> bool {
    (0..width).all(|i| bit_at(a, pos_a + i) == bit_at(b, pos_b + i))
}

/// Raw (unpadded) RSA encryption: `mapped` is right-aligned into an
/// `rsa_size`-byte zero-filled buffer and raised to `e mod n`. Anyone
/// with the same public key and phrase reproduces the identical
/// ciphertext, which is what lets a verifier redo the position search.
fn raw_rsa_encrypt(pubkey: &RsaPublicKey, mapped: &[u8]) -> Vec<u8> {
    let rsa_size = pubkey.size();
    let mut padded = vec![0u8; rsa_size];
    padded[rsa_size - mapped.len()..].copy_from_slice(mapped);

    let m = BigUint::from_bytes_be(&padded);
    let n = pubkey.n();
    let e = pubkey.e();
    let c = m.modpow(e, n);

    let mut out = c.to_bytes_be();
    while out.len() < rsa_size {
        out.insert(0, 0);
    }
    out
}

const MAX_MATCHES: usize = SHA512_BITS;

/// Finds up to `MAX_MATCHES / bitstring_bits` matching windows, stopping
/// at the first hash segment (scanning from the end of the hash) for
/// which no ciphertext window matches. Returns the matched positions in
/// order found.
fn find_match_positions(
    encrypted: &[u8],
    hash: &[u8; SHA512_SIZE],
    bitstring_bits: usize,
) -> Vec<usize> {
    let mut positions = Vec::new();
    let esize_bits = encrypted.len() * 8;

    for i in 0..(MAX_MATCHES / bitstring_bits) {
        let hashpos = SHA512_BITS - (i + 1) * bitstring_bits;
        let mut found = None;
        for j in 0..=esize_bits.saturating_sub(bitstring_bits) {
            if bitstring_matches(encrypted, j, hash, hashpos, bitstring_bits) {
                found = Some(j);
                break;
            }
        }
        match found {
            Some(j) => positions.push(j),
            None => break,
        }
    }
    positions
}

/// One attempt at deriving an AHRA for a freshly generated key pair.
/// Returns `None` if fewer than `min_matches` positions were found, in
/// which case the caller should generate a new key pair and retry
/// (`keys.c`'s `generate_key` loops `generate_one_key` until success).
pub fn make_address(
    pubkey: &RsaPublicKey,
    phrase: &str,
    lang: &str,
    bitstring_bits: usize,
    min_matches: usize,
) -> Option<Ahra> {
    let mapped = mapped_phrase(phrase);
    let mut hasher = Sha512::new();
    hasher.update(&mapped);
    let hash: [u8; SHA512_SIZE] = hasher.finalize().into();

    let encrypted = raw_rsa_encrypt(pubkey, &mapped);
    let positions = find_match_positions(&encrypted, &hash, bitstring_bits);

    if positions.len() < min_matches {
        return None;
    }
    Some(Ahra {
        phrase: phrase.to_string(),
        positions,
        lang: Some(lang.to_string()),
        bitstring_bits: Some(bitstring_bits),
    })
}

/// Generates RSA key pairs of `bits` size until one yields a valid AHRA,
/// per `generate_key`/`generate_one_key`. Terminates with probability 1
/// given enough attempts but has no hard iteration bound, matching the
/// original's `do { } while (result == NULL)` loop.
pub fn generate_key<R: rand::RngCore + rand::CryptoRng>(
    rng: &mut R,
    bits: usize,
    phrase: &str,
    lang: &str,
    bitstring_bits: usize,
    min_matches: usize,
) -> (RsaPrivateKey, Ahra) {
    loop {
        let priv_key = RsaPrivateKey::new(rng, bits).expect("RSA key generation");
        let pub_key = RsaPublicKey::from(&priv_key);
        if let Some(ahra) = make_address(&pub_key, phrase, lang, bitstring_bits, min_matches) {
            return (priv_key, ahra);
        }
    }
}

/// Re-derives the encryption and hash from `ahra`'s phrase against
/// `pubkey` and checks that every recorded position still matches.
/// `verify_bc_key` in the original.
pub fn verify_bc_key(ahra: &Ahra, pubkey: &RsaPublicKey) -> bool {
    let (Some(bitstring_bits), positions) = (ahra.bitstring_bits, &ahra.positions) else {
        return false;
    };
    if positions.is_empty() {
        return false;
    }

    let mapped = mapped_phrase(&ahra.phrase);
    let mut hasher = Sha512::new();
    hasher.update(&mapped);
    let hash: [u8; SHA512_SIZE] = hasher.finalize().into();
    let encrypted = raw_rsa_encrypt(pubkey, &mapped);

    for (i, &pos) in positions.iter().enumerate() {
        let hashpos = SHA512_BITS - (i + 1) * bitstring_bits;
        if pos + bitstring_bits > encrypted.len() * 8 {
            return false;
        }
        if !bitstring_matches(&encrypted, pos, &hash, hashpos, bitstring_bits) {
            return false;
        }
    }
    true
}
