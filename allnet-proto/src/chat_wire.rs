//! Wire layout for the xchat chat descriptor and its control-message
//! sub-format (spec §4.10): a 16-byte `message_ack`, a 64-bit sequence
//! `counter` (high bit reserved as a "this is a control message" flag),
//! and a 48-bit timestamp with a 16-bit signed timezone offset.
//!
//! Control messages (`counter == COUNTER_FLAG`) carry a type byte
//! followed by a type-specific body; the only type defined by this spec
//! is `CHAT_CONTROL_TYPE_REQUEST`, a retransmit request.

use crate::error::ProtoError;

/// High bit of `counter`, reserved to mark a descriptor as carrying a
/// control message rather than ordinary chat content.
pub const COUNTER_FLAG: u64 = 1 << 63;

/// The only control-message type this spec defines: a retransmit
/// (missing-ranges) request.
pub const CHAT_CONTROL_TYPE_REQUEST: u8 = 1;

/// `message_ack(16) | counter(8, BE) | timestamp(6, BE) | tz_offset(2, BE)`.
pub const CHAT_DESCRIPTOR_SIZE: usize = 16 + 8 + 6 + 2;

/// The fixed 32-byte header prefixing every xchat message (spec §4.10).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatDescriptor {
    pub message_ack: [u8; 16],
    pub counter: u64,
    /// Seconds since the AllNet epoch, 48 significant bits.
    pub timestamp: u64,
    pub tz_offset_minutes: i16,
}

impl ChatDescriptor {
    /// Whether `counter` marks this descriptor as carrying a control
    /// message instead of ordinary chat content.
    pub fn is_control(&self) -> bool {
        self.counter == COUNTER_FLAG
    }

    pub fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.message_ack);
        out.extend_from_slice(&self.counter.to_be_bytes());
        let ts = self.timestamp & 0x0000_ffff_ffff_ffff;
        out.extend_from_slice(&ts.to_be_bytes()[2..8]);
        out.extend_from_slice(&self.tz_offset_minutes.to_be_bytes());
    }

    pub fn decode(buf: &[u8]) -> Result<(Self, &[u8]), ProtoError> {
        if buf.len() < CHAT_DESCRIPTOR_SIZE {
            return Err(ProtoError::MalformedPacket {
                need: CHAT_DESCRIPTOR_SIZE,
                got: buf.len(),
            });
        }
        let mut message_ack = [0u8; 16];
        message_ack.copy_from_slice(&buf[0..16]);
        let counter = u64::from_be_bytes(buf[16..24].try_into().unwrap());
        let mut ts_bytes = [0u8; 8];
        ts_bytes[2..8].copy_from_slice(&buf[24..30]);
        let timestamp = u64::from_be_bytes(ts_bytes);
        let tz_offset_minutes = i16::from_be_bytes(buf[30..32].try_into().unwrap());
        Ok((
            Self {
                message_ack,
                counter,
                timestamp,
                tz_offset_minutes,
            },
            &buf[CHAT_DESCRIPTOR_SIZE..],
        ))
    }
}

/// `CHAT_CONTROL_TYPE_REQUEST`'s body: missing sequence numbers as
/// standalone singles plus inclusive ranges, and the requester's
/// `last_received` cursor (spec §4.10). Wire layout:
/// `type(1) | num_singles(2, BE) | num_ranges(2, BE) | last_received(8, BE)
/// | singles[num_singles](8 each) | ranges[num_ranges](16 each: low, high)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetransmitRequest {
    pub singles: Vec<u64>,
    pub ranges: Vec<(u64, u64)>,
    pub last_received: u64,
}

impl RetransmitRequest {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(13 + self.singles.len() * 8 + self.ranges.len() * 16);
        out.push(CHAT_CONTROL_TYPE_REQUEST);
        out.extend_from_slice(&(self.singles.len() as u16).to_be_bytes());
        out.extend_from_slice(&(self.ranges.len() as u16).to_be_bytes());
        out.extend_from_slice(&self.last_received.to_be_bytes());
        for s in &self.singles {
            out.extend_from_slice(&s.to_be_bytes());
        }
        for (lo, hi) in &self.ranges {
            out.extend_from_slice(&lo.to_be_bytes());
            out.extend_from_slice(&hi.to_be_bytes());
        }
        out
    }

    pub fn decode(buf: &[u8]) -> Result<Self, ProtoError> {
        const FIXED: usize = 1 + 2 + 2 + 8;
        if buf.len() < FIXED {
            return Err(ProtoError::MalformedPacket {
                need: FIXED,
                got: buf.len(),
            });
        }
        if buf[0] != CHAT_CONTROL_TYPE_REQUEST {
            return Err(ProtoError::UnknownMgmtType(buf[0]));
        }
        let num_singles = u16::from_be_bytes([buf[1], buf[2]]) as usize;
        let num_ranges = u16::from_be_bytes([buf[3], buf[4]]) as usize;
        let last_received = u64::from_be_bytes(buf[5..13].try_into().unwrap());

        let need = FIXED + num_singles * 8 + num_ranges * 16;
        if buf.len() < need {
            return Err(ProtoError::InconsistentLength {
                declared: need,
                remaining: buf.len(),
            });
        }
        let mut offset = FIXED;
        let mut singles = Vec::with_capacity(num_singles);
        for _ in 0..num_singles {
            singles.push(u64::from_be_bytes(buf[offset..offset + 8].try_into().unwrap()));
            offset += 8;
        }
        let mut ranges = Vec::with_capacity(num_ranges);
        for _ in 0..num_ranges {
            let lo = u64::from_be_bytes(buf[offset..offset + 8].try_into().unwrap());
            let hi = u64::from_be_bytes(buf[offset + 8..offset + 16].try_into().unwrap());
            ranges.push((lo, hi));
            offset += 16;
        }
        Ok(Self {
            singles,
            ranges,
            last_received,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_round_trips() {
        let d = ChatDescriptor {
            message_ack: [7u8; 16],
            counter: 42,
            timestamp: 0x0000_a1b2_c3d4,
            tz_offset_minutes: -300,
        };
        let mut buf = Vec::new();
        d.encode(&mut buf);
        assert_eq!(buf.len(), CHAT_DESCRIPTOR_SIZE);
        let (decoded, rest) = ChatDescriptor::decode(&buf).unwrap();
        assert_eq!(decoded, d);
        assert!(rest.is_empty());
        assert!(!decoded.is_control());
    }

    #[test]
    fn control_flag_is_detected() {
        let d = ChatDescriptor {
            message_ack: [0u8; 16],
            counter: COUNTER_FLAG,
            timestamp: 0,
            tz_offset_minutes: 0,
        };
        assert!(d.is_control());
    }

    #[test]
    fn retransmit_request_round_trips() {
        let req = RetransmitRequest {
            singles: vec![4],
            ranges: vec![(6, 6)],
            last_received: 8,
        };
        let encoded = req.encode();
        let decoded = RetransmitRequest::decode(&encoded).unwrap();
        assert_eq!(decoded, req);
    }

    #[test]
    fn empty_retransmit_request_round_trips() {
        let req = RetransmitRequest {
            singles: vec![],
            ranges: vec![],
            last_received: 0,
        };
        let encoded = req.encode();
        let decoded = RetransmitRequest::decode(&encoded).unwrap();
        assert_eq!(decoded, req);
    }

    #[test]
    fn short_buffer_is_malformed() {
        let buf = [0u8; 3];
        assert!(matches!(
            ChatDescriptor::decode(&buf),
            Err(ProtoError::MalformedPacket { .. })
        ));
    }
}
