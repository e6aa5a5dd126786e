//! Stateful, authenticated AES-256 stream cipher (spec §4.6), grounded on
//! `original_source/src/lib/stream.c`: keystream bytes come from
//! AES-ECB-encrypting a 16-byte block built from an internal counter,
//! XORed with the plaintext one byte at a time. Every encrypted buffer is
//! followed by the low `counter_size` bytes of the absolute byte position
//! (so a receiver that lost some packets can resynchronize) and an
//! HMAC-SHA512 over everything sent so far in that call, truncated to
//! `hash_size` bytes. `decrypt_buffer` checks the HMAC in constant time
//! before touching any state, so a forged or replayed buffer cannot
//! desynchronize a future legitimate one (spec invariant 2 / Scenario C).

use aes::cipher::{BlockEncrypt, KeyInit};
use aes::{Aes256, Block};
use hmac::{Hmac, Mac};
use sha2::Sha512;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::CryptoError;

type HmacSha512 = Hmac<Sha512>;

pub const STREAM_KEY_SIZE: usize = 32;
pub const STREAM_SECRET_SIZE: usize = 32;
const AES_BLOCK_SIZE: usize = 16;
const SHA512_SIZE: usize = 64;

/// One direction of an authenticated stream. Two contacts share a key and
/// secret but each keeps an independent `StreamState` per direction.
pub struct StreamState {
    cipher: Aes256,
    secret: [u8; STREAM_SECRET_SIZE],
    counter_size: usize,
    hash_size: usize,
    counter: u64,
    block_offset: usize,
    block: [u8; AES_BLOCK_SIZE],
    block_valid: bool,
}

impl Drop for StreamState {
    fn drop(&mut self) {
        self.secret.zeroize();
        self.block.zeroize();
    }
}

impl StreamState {
    /// `counter_size` (bytes of absolute position sent per buffer) must be
    /// in `1..=8`; `hash_size` (bytes of HMAC sent per buffer) must be in
    /// `0..=64` (spec §4.6).
    pub fn new(
        key: &[u8; STREAM_KEY_SIZE],
        secret: &[u8; STREAM_SECRET_SIZE],
        counter_size: usize,
        hash_size: usize,
    ) -> Result<Self, CryptoError> {
        if !(1..=8).contains(&counter_size) || hash_size > SHA512_SIZE {
            return Err(CryptoError::InvalidStreamParams);
        }
        Ok(Self {
            cipher: Aes256::new(key.into()),
            secret: *secret,
            counter_size,
            hash_size,
            counter: 1,
            block_offset: 0,
            block: [0u8; AES_BLOCK_SIZE],
            block_valid: false,
        })
    }

    fn counter_block(counter: u64) -> [u8; AES_BLOCK_SIZE] {
        let mut block = [0u8; AES_BLOCK_SIZE];
        block[8..].copy_from_slice(&counter.to_be_bytes());
        block
    }

    fn next_keystream_byte(&mut self) -> u8 {
        if !self.block_valid {
            let mut block = Block::clone_from_slice(&Self::counter_block(self.counter));
            self.cipher.encrypt_block(&mut block);
            self.block.copy_from_slice(&block);
            self.block_valid = true;
        }
        let byte = self.block[self.block_offset];
        self.block_offset += 1;
        if self.block_offset == AES_BLOCK_SIZE {
            self.block_offset = 0;
            self.counter += 1;
            self.block_valid = false;
        }
        byte
    }

    fn absolute_position(&self) -> u64 {
        self.counter * (AES_BLOCK_SIZE as u64) + (self.block_offset as u64)
    }

    fn set_absolute_position(&mut self, position: u64) {
        self.counter = position / (AES_BLOCK_SIZE as u64);
        self.block_offset = (position % (AES_BLOCK_SIZE as u64)) as usize;
        self.block_valid = false;
    }

    /// Encrypts `plaintext`, returning `|plaintext| + counter_size +
    /// hash_size` bytes.
    pub fn encrypt_buffer(&mut self, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if plaintext.is_empty() {
            return Err(CryptoError::InvalidStreamParams);
        }
        let send_position = self.absolute_position();

        let mut result = Vec::with_capacity(plaintext.len() + self.counter_size + self.hash_size);
        for &b in plaintext {
            result.push(b ^ self.next_keystream_byte());
        }

        let position_bytes = send_position.to_be_bytes();
        result.extend_from_slice(&position_bytes[8 - self.counter_size..]);

        if self.hash_size > 0 {
            let mut mac = HmacSha512::new_from_slice(&self.secret)
                .expect("HMAC accepts any key length");
            mac.update(&result);
            let tag = mac.finalize().into_bytes();
            result.extend_from_slice(&tag[..self.hash_size]);
        }
        Ok(result)
    }

    /// Verifies and decrypts `packet`. On HMAC mismatch returns
    /// [`CryptoError::AuthFailure`] and leaves `self` untouched.
    pub fn decrypt_buffer(&mut self, packet: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let overhead = self.counter_size + self.hash_size;
        if packet.len() <= overhead {
            return Err(CryptoError::InvalidStreamParams);
        }

        if self.hash_size > 0 {
            let (signed, received_mac) = packet.split_at(packet.len() - self.hash_size);
            let mut mac = HmacSha512::new_from_slice(&self.secret)
                .expect("HMAC accepts any key length");
            mac.update(signed);
            let expected = mac.finalize().into_bytes();
            if expected[..self.hash_size].ct_eq(received_mac).unwrap_u8() != 1 {
                return Err(CryptoError::AuthFailure);
            }
        }

        let ciphertext_end = packet.len() - overhead;
        let counter_bytes = &packet[ciphertext_end..ciphertext_end + self.counter_size];

        let cur_position = self.absolute_position();
        let shift = self.counter_size * 8;
        let mut received = [0u8; 8];
        received[8 - self.counter_size..].copy_from_slice(counter_bytes);
        let received_value = u64::from_be_bytes(received);
        let new_position = if shift >= 64 {
            received_value
        } else {
            ((cur_position >> shift) << shift) | received_value
        };
        self.set_absolute_position(new_position);

        let plaintext = packet[..ciphertext_end]
            .iter()
            .map(|&b| b ^ self.next_keystream_byte())
            .collect();
        Ok(plaintext)
    }
}

/// Secret material required to build both directions of a stream session.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct StreamSecret {
    pub key: [u8; STREAM_KEY_SIZE],
    pub secret: [u8; STREAM_SECRET_SIZE],
}

impl StreamSecret {
    pub fn new_state(
        &self,
        counter_size: usize,
        hash_size: usize,
    ) -> Result<StreamState, CryptoError> {
        StreamState::new(&self.key, &self.secret, counter_size, hash_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(seed: u8) -> StreamSecret {
        StreamSecret {
            key: [seed; STREAM_KEY_SIZE],
            secret: [seed.wrapping_add(1); STREAM_SECRET_SIZE],
        }
    }

    #[test]
    fn encrypt_then_decrypt_round_trips() {
        let s = secret(7);
        let mut tx = s.new_state(8, 16).unwrap();
        let mut rx = s.new_state(8, 16).unwrap();

        let msg = b"hello over the wire".to_vec();
        let packet = tx.encrypt_buffer(&msg).unwrap();
        assert_eq!(packet.len(), msg.len() + 8 + 16);

        let decrypted = rx.decrypt_buffer(&packet).unwrap();
        assert_eq!(decrypted, msg);
    }

    #[test]
    fn sequential_messages_stay_in_sync_across_block_boundaries() {
        let s = secret(11);
        let mut tx = s.new_state(4, 8).unwrap();
        let mut rx = s.new_state(4, 8).unwrap();

        for i in 0u8..5 {
            let msg = vec![i; 20];
            let packet = tx.encrypt_buffer(&msg).unwrap();
            let decrypted = rx.decrypt_buffer(&packet).unwrap();
            assert_eq!(decrypted, msg);
        }
    }

    #[test]
    fn tolerates_a_dropped_message_by_resynchronizing_on_position() {
        let s = secret(13);
        let mut tx = s.new_state(8, 8).unwrap();
        let mut rx = s.new_state(8, 8).unwrap();

        let first = tx.encrypt_buffer(&vec![1u8; 16]).unwrap();
        let second = tx.encrypt_buffer(&vec![2u8; 16]).unwrap();

        // rx never sees `first`; decrypting `second` must still work because
        // the absolute position is carried in the packet.
        let decrypted = rx.decrypt_buffer(&second).unwrap();
        assert_eq!(decrypted, vec![2u8; 16]);
    }

    #[test]
    fn tampered_ciphertext_is_rejected_and_state_is_unchanged() {
        let s = secret(21);
        let mut tx = s.new_state(8, 16).unwrap();
        let mut rx = s.new_state(8, 16).unwrap();

        let good_original = vec![5u8; 10];
        let good_packet = tx.encrypt_buffer(&good_original).unwrap();

        let mut tampered = good_packet.clone();
        tampered[0] ^= 0xff;
        assert!(matches!(
            rx.decrypt_buffer(&tampered),
            Err(CryptoError::AuthFailure)
        ));

        // rx state must be untouched: the original packet still decrypts.
        let decrypted = rx.decrypt_buffer(&good_packet).unwrap();
        assert_eq!(decrypted, good_original);
    }

    #[test]
    fn rejects_invalid_counter_and_hash_sizes() {
        let s = secret(30);
        assert!(s.new_state(0, 8).is_err());
        assert!(s.new_state(9, 8).is_err());
        assert!(s.new_state(8, 65).is_err());
        assert!(s.new_state(8, 0).is_ok());
    }
}
