//! Wire layout for the key-request management sub-body (spec §4.7/§6,
//! component table's "key-request responder"): a requester names a
//! broadcast key by its AHRA text and the responder sends back the
//! matching public key. The layout also carries an optional RSA public
//! key for an encrypted reply; spec §9 notes the original source disables
//! that path (`#if 0`), so it is parsed/emitted here for wire
//! compatibility only and never acted upon by the responder.

use crate::error::ProtoError;

const FIXED_SIZE: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRequest {
    pub ahra: String,
    pub reply_pubkey: Vec<u8>,
}

impl KeyRequest {
    pub fn encode(&self) -> Vec<u8> {
        let ahra_bytes = self.ahra.as_bytes();
        let mut out = Vec::with_capacity(FIXED_SIZE + ahra_bytes.len() + self.reply_pubkey.len());
        out.extend_from_slice(&(ahra_bytes.len() as u16).to_be_bytes());
        out.extend_from_slice(&(self.reply_pubkey.len() as u16).to_be_bytes());
        out.extend_from_slice(ahra_bytes);
        out.extend_from_slice(&self.reply_pubkey);
        out
    }

    pub fn decode(buf: &[u8]) -> Result<Self, ProtoError> {
        if buf.len() < FIXED_SIZE {
            return Err(ProtoError::MalformedPacket {
                need: FIXED_SIZE,
                got: buf.len(),
            });
        }
        let ahra_len = u16::from_be_bytes([buf[0], buf[1]]) as usize;
        let pubkey_len = u16::from_be_bytes([buf[2], buf[3]]) as usize;
        let needed = FIXED_SIZE + ahra_len + pubkey_len;
        if buf.len() < needed {
            return Err(ProtoError::InconsistentLength {
                declared: needed,
                remaining: buf.len(),
            });
        }
        let ahra = String::from_utf8(buf[FIXED_SIZE..FIXED_SIZE + ahra_len].to_vec())
            .map_err(|_| ProtoError::MalformedPacket { need: ahra_len, got: 0 })?;
        let reply_pubkey = buf[FIXED_SIZE + ahra_len..needed].to_vec();
        Ok(Self { ahra, reply_pubkey })
    }
}

/// A key-request reply body: the responder's public key bytes (DER), or
/// empty when no matching broadcast key was found.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyRequestReply {
    pub pubkey: Vec<u8>,
}

impl KeyRequestReply {
    pub fn encode(&self) -> Vec<u8> {
        self.pubkey.clone()
    }

    pub fn decode(buf: &[u8]) -> Self {
        Self {
            pubkey: buf.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_request_round_trips_with_reply_key() {
        let req = KeyRequest {
            ahra: "hello world@3.17.40,en,16".to_string(),
            reply_pubkey: vec![1, 2, 3, 4],
        };
        let encoded = req.encode();
        let decoded = KeyRequest::decode(&encoded).unwrap();
        assert_eq!(decoded, req);
    }

    #[test]
    fn key_request_round_trips_without_reply_key() {
        let req = KeyRequest {
            ahra: "x@1".to_string(),
            reply_pubkey: vec![],
        };
        let decoded = KeyRequest::decode(&req.encode()).unwrap();
        assert_eq!(decoded, req);
    }

    #[test]
    fn short_buffer_is_malformed() {
        assert!(KeyRequest::decode(&[0, 1]).is_err());
    }

    #[test]
    fn reply_round_trips() {
        let reply = KeyRequestReply {
            pubkey: vec![9, 9, 9],
        };
        assert_eq!(KeyRequestReply::decode(&reply.encode()), reply);
    }

    #[test]
    fn empty_reply_means_no_match() {
        let reply = KeyRequestReply::default();
        assert!(reply.pubkey.is_empty());
    }
}
