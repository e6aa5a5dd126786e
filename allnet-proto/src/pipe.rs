//! Wire layout for the local pipe-message framing header (spec §4.2/§6):
//! `magic(1) | length(4, BE) | priority(4, BE)` followed by `length` bytes
//! of payload. The actual stream I/O lives in `allnet-pipe`; this module
//! only owns the byte layout.

use crate::constants::{PIPE_HEADER_SIZE, PIPE_MAGIC};
use crate::error::ProtoError;
use crate::priority::Priority;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipeHeader {
    pub length: u32,
    pub priority: Priority,
}

impl PipeHeader {
    pub fn encode(&self) -> [u8; PIPE_HEADER_SIZE] {
        let mut out = [0u8; PIPE_HEADER_SIZE];
        out[0] = PIPE_MAGIC;
        out[1..5].copy_from_slice(&self.length.to_be_bytes());
        out[5..9].copy_from_slice(&self.priority.to_be_bytes());
        out
    }

    pub fn decode(buf: &[u8]) -> Result<Self, ProtoError> {
        if buf.len() < PIPE_HEADER_SIZE {
            return Err(ProtoError::MalformedPacket {
                need: PIPE_HEADER_SIZE,
                got: buf.len(),
            });
        }
        if buf[0] != PIPE_MAGIC {
            return Err(ProtoError::InconsistentLength {
                declared: PIPE_MAGIC as usize,
                remaining: buf[0] as usize,
            });
        }
        let length = u32::from_be_bytes(buf[1..5].try_into().unwrap());
        let priority = u32::from_be_bytes(buf[5..9].try_into().unwrap());
        Ok(Self { length, priority })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trips() {
        let h = PipeHeader {
            length: 1234,
            priority: 99,
        };
        let encoded = h.encode();
        let decoded = PipeHeader::decode(&encoded).unwrap();
        assert_eq!(decoded, h);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut buf = [0u8; PIPE_HEADER_SIZE];
        buf[0] = 0;
        assert!(PipeHeader::decode(&buf).is_err());
    }

    #[test]
    fn rejects_short_buffer() {
        let buf = [0u8; PIPE_HEADER_SIZE - 1];
        assert!(matches!(
            PipeHeader::decode(&buf),
            Err(ProtoError::MalformedPacket { .. })
        ));
    }
}
