//! Wire layout for trace-request bodies and path entries (spec §4.9/§6).

use crate::address::Address;
use crate::constants::{TRACE_ENTRY_SIZE, TRACE_REQ_FIXED_SIZE};
use crate::error::ProtoError;

/// One hop's worth of timing/address information in a trace path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceEntry {
    pub precision: u8,
    pub seconds: u64,
    pub seconds_fraction: u64,
    pub nbits: u8,
    pub hops_seen: u8,
    pub address: Address,
}

impl TraceEntry {
    pub fn encode(&self, out: &mut Vec<u8>) {
        out.push(self.precision);
        out.extend_from_slice(&[0u8; 3]); // reserved
        out.extend_from_slice(&self.seconds.to_be_bytes());
        out.extend_from_slice(&self.seconds_fraction.to_be_bytes());
        out.push(self.nbits);
        out.push(self.hops_seen);
        out.extend_from_slice(&[0u8; 2]); // reserved
        out.extend_from_slice(self.address.bytes());
        debug_assert_eq!(out.len() % TRACE_ENTRY_SIZE, 0);
    }

    pub fn decode(buf: &[u8]) -> Result<Self, ProtoError> {
        if buf.len() < TRACE_ENTRY_SIZE {
            return Err(ProtoError::MalformedPacket {
                need: TRACE_ENTRY_SIZE,
                got: buf.len(),
            });
        }
        let precision = buf[0];
        let seconds = u64::from_be_bytes(buf[4..12].try_into().unwrap());
        let seconds_fraction = u64::from_be_bytes(buf[12..20].try_into().unwrap());
        let nbits = buf[20];
        let hops_seen = buf[21];
        let mut addr_bytes = [0u8; 8];
        addr_bytes.copy_from_slice(&buf[24..32]);
        let address =
            Address::new(addr_bytes, nbits).map_err(|_| ProtoError::MalformedAddress(nbits))?;
        Ok(Self {
            precision,
            seconds,
            seconds_fraction,
            nbits,
            hops_seen,
            address,
        })
    }

    /// Decodes `seconds_fraction` into microseconds, per the precision
    /// rules in spec §4.9:
    /// - `precision <= 64`: the fraction is a binary `0.f` (f interpreted
    ///   as the top `precision` bits of a 64-bit fixed-point fraction).
    /// - `64 < precision <= 70`: the fraction is `f * 10^(70 - precision)`
    ///   microseconds.
    /// - `precision > 70`: the fraction is `f / 10^(precision - 70)`
    ///   microseconds.
    pub fn fraction_micros(&self) -> u64 {
        fraction_to_micros(self.precision, self.seconds_fraction)
    }
}

pub fn fraction_to_micros(precision: u8, f: u64) -> u64 {
    if precision <= 64 {
        // f is the numerator of a binary fraction f / 2^64; scale to
        // microseconds by multiplying before shifting to preserve
        // precision within u128, then narrowing back to u64.
        (((f as u128) * 1_000_000u128) >> 64) as u64
    } else if precision <= 70 {
        f.saturating_mul(10u64.pow((70 - precision) as u32))
    } else {
        let divisor = 10u64.pow((precision - 70).min(19) as u32);
        if divisor == 0 {
            0
        } else {
            f / divisor
        }
    }
}

/// A trace request's variable-length body (spec §4.9/§6): an
/// `intermediate_replies` flag, a 16-byte `trace_id`, the accumulated
/// path entries, and an optional RSA public key for encrypted replies
/// (spec §9: the key-encrypted-reply path is out of scope; the field is
/// still parsed/emitted for wire compatibility but never acted upon).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceRequest {
    pub intermediate_replies: bool,
    pub trace_id: [u8; 16],
    pub entries: Vec<TraceEntry>,
    pub pubkey: Vec<u8>,
}

impl TraceRequest {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(
            TRACE_REQ_FIXED_SIZE + self.entries.len() * TRACE_ENTRY_SIZE + self.pubkey.len(),
        );
        out.push(self.intermediate_replies as u8);
        out.push(self.entries.len() as u8);
        out.extend_from_slice(&(self.pubkey.len() as u16).to_be_bytes());
        out.extend_from_slice(&self.trace_id);
        for e in &self.entries {
            e.encode(&mut out);
        }
        out.extend_from_slice(&self.pubkey);
        out
    }

    pub fn decode(buf: &[u8]) -> Result<Self, ProtoError> {
        if buf.len() < TRACE_REQ_FIXED_SIZE {
            return Err(ProtoError::MalformedPacket {
                need: TRACE_REQ_FIXED_SIZE,
                got: buf.len(),
            });
        }
        let intermediate_replies = buf[0] != 0;
        let num_entries = buf[1] as usize;
        let pubkey_size = u16::from_be_bytes([buf[2], buf[3]]) as usize;
        let mut trace_id = [0u8; 16];
        trace_id.copy_from_slice(&buf[4..20]);
        let mut offset = TRACE_REQ_FIXED_SIZE;
        let mut entries = Vec::with_capacity(num_entries);
        for _ in 0..num_entries {
            let entry = TraceEntry::decode(&buf[offset..])?;
            entries.push(entry);
            offset += TRACE_ENTRY_SIZE;
        }
        let needed = offset + pubkey_size;
        if buf.len() < needed {
            return Err(ProtoError::InconsistentLength {
                declared: needed,
                remaining: buf.len(),
            });
        }
        let pubkey = buf[offset..needed].to_vec();
        Ok(Self {
            intermediate_replies,
            trace_id,
            entries,
            pubkey,
        })
    }
}

/// A trace reply's body (spec §4.9): a path of entries plus whether this
/// is the final, endpoint-matching reply or an intermediate one from a
/// transit node along the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceReply {
    pub intermediate: bool,
    pub entries: Vec<TraceEntry>,
}

impl TraceReply {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(2 + self.entries.len() * TRACE_ENTRY_SIZE);
        out.push(self.intermediate as u8);
        out.push(self.entries.len() as u8);
        for e in &self.entries {
            e.encode(&mut out);
        }
        out
    }

    pub fn decode(buf: &[u8]) -> Result<Self, ProtoError> {
        if buf.len() < 2 {
            return Err(ProtoError::MalformedPacket { need: 2, got: buf.len() });
        }
        let intermediate = buf[0] != 0;
        let num_entries = buf[1] as usize;
        let mut offset = 2;
        let mut entries = Vec::with_capacity(num_entries);
        for _ in 0..num_entries {
            let entry = TraceEntry::decode(&buf[offset..])?;
            entries.push(entry);
            offset += TRACE_ENTRY_SIZE;
        }
        Ok(Self {
            intermediate,
            entries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(hops_seen: u8) -> TraceEntry {
        TraceEntry {
            precision: 64,
            seconds: 1_000,
            seconds_fraction: 1 << 63, // 0.5
            nbits: 16,
            hops_seen,
            address: Address::new([9, 9, 0, 0, 0, 0, 0, 0], 16).unwrap(),
        }
    }

    #[test]
    fn entry_round_trips() {
        let e = entry(1);
        let mut buf = Vec::new();
        e.encode(&mut buf);
        assert_eq!(buf.len(), TRACE_ENTRY_SIZE);
        let decoded = TraceEntry::decode(&buf).unwrap();
        assert_eq!(decoded, e);
    }

    #[test]
    fn binary_fraction_decodes_to_half_second() {
        assert_eq!(fraction_to_micros(64, 1u64 << 63), 500_000);
    }

    #[test]
    fn microsecond_scaled_fraction() {
        // precision 69 means f is already in units of 10 microseconds.
        assert_eq!(fraction_to_micros(69, 5), 50);
    }

    #[test]
    fn sub_microsecond_precision_divides_down() {
        // precision 73 means f is in units of 1/1000 microsecond.
        assert_eq!(fraction_to_micros(73, 5000), 5);
    }

    #[test]
    fn trace_request_round_trips_with_entries_and_key() {
        let req = TraceRequest {
            intermediate_replies: true,
            trace_id: [7u8; 16],
            entries: vec![entry(0), entry(1)],
            pubkey: vec![1, 2, 3, 4, 5],
        };
        let encoded = req.encode();
        let decoded = TraceRequest::decode(&encoded).unwrap();
        assert_eq!(decoded, req);
    }

    #[test]
    fn empty_request_round_trips() {
        let req = TraceRequest {
            intermediate_replies: false,
            trace_id: [0u8; 16],
            entries: vec![],
            pubkey: vec![],
        };
        let encoded = req.encode();
        assert_eq!(encoded.len(), TRACE_REQ_FIXED_SIZE);
        let decoded = TraceRequest::decode(&encoded).unwrap();
        assert_eq!(decoded, req);
    }

    #[test]
    fn trace_reply_round_trips() {
        let reply = TraceReply {
            intermediate: true,
            entries: vec![entry(3), entry(4)],
        };
        let encoded = reply.encode();
        let decoded = TraceReply::decode(&encoded).unwrap();
        assert_eq!(decoded, reply);
    }

    #[test]
    fn empty_trace_reply_round_trips() {
        let reply = TraceReply {
            intermediate: false,
            entries: vec![],
        };
        let encoded = reply.encode();
        assert_eq!(encoded.len(), 2);
        let decoded = TraceReply::decode(&encoded).unwrap();
        assert_eq!(decoded, reply);
    }
}
