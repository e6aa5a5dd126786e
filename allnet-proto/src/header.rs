use crate::address::Address;
use crate::constants::*;
use crate::error::ProtoError;
use crate::ALLNET_VERSION;

/// `message_type` values from spec §6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageType {
    Data = 1,
    Ack = 2,
    KeyReq = 3,
    KeyXchg = 4,
    Clear = 5,
    Mgmt = 6,
}

impl MessageType {
    pub fn from_u8(v: u8) -> Result<Self, ProtoError> {
        Ok(match v {
            1 => Self::Data,
            2 => Self::Ack,
            3 => Self::KeyReq,
            4 => Self::KeyXchg,
            5 => Self::Clear,
            6 => Self::Mgmt,
            other => return Err(ProtoError::UnknownMessageType(other)),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SigAlgo {
    None = 0,
    RsaPkcs1 = 1,
}

impl SigAlgo {
    pub fn from_u8(v: u8) -> Result<Self, ProtoError> {
        Ok(match v {
            0 => Self::None,
            1 => Self::RsaPkcs1,
            other => return Err(ProtoError::UnknownSigAlgo(other)),
        })
    }
}

/// Transport flag bits (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransportFlags(pub u8);

impl TransportFlags {
    pub const ACK_REQ: u8 = 0x01;
    pub const LARGE: u8 = 0x02;
    pub const EXPIRATION: u8 = 0x04;
    pub const DO_NOT_CACHE: u8 = 0x08;

    pub fn has(self, bit: u8) -> bool {
        (self.0 & bit) != 0
    }

    /// Whether an ack should be emitted for this packet. Spec §9 calls out
    /// the source's precedence bug (`transport & ACK_REQ == 0` parses as
    /// `transport & (ACK_REQ == 0)`); this implements the corrected,
    /// intended semantics: "if the ACK_REQ bit is set, emit an ack".
    pub fn wants_ack(self) -> bool {
        self.has(Self::ACK_REQ)
    }
}

/// The fixed 24-byte prefix on every AllNet packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub message_type: MessageType,
    pub hops: u8,
    pub max_hops: u8,
    pub sig_algo: SigAlgo,
    pub transport: TransportFlags,
    pub source: Address,
    pub destination: Address,
}

impl Header {
    pub fn encode(&self, out: &mut Vec<u8>) {
        out.push(ALLNET_VERSION);
        out.push(self.message_type as u8);
        out.push(self.hops);
        out.push(self.max_hops);
        out.push(self.source.nbits());
        out.push(self.destination.nbits());
        out.push(self.sig_algo as u8);
        out.push(self.transport.0);
        out.extend_from_slice(self.source.bytes());
        out.extend_from_slice(self.destination.bytes());
        debug_assert_eq!(out.len(), HEADER_SIZE);
    }

    pub fn decode(buf: &[u8]) -> Result<(Self, &[u8]), ProtoError> {
        if buf.len() < HEADER_SIZE {
            return Err(ProtoError::MalformedPacket {
                need: HEADER_SIZE,
                got: buf.len(),
            });
        }
        let version = buf[0];
        if version != ALLNET_VERSION {
            return Err(ProtoError::UnsupportedVersion(version));
        }
        let message_type = MessageType::from_u8(buf[1])?;
        let hops = buf[2];
        let max_hops = buf[3];
        let src_nbits = buf[4];
        let dst_nbits = buf[5];
        let sig_algo = SigAlgo::from_u8(buf[6])?;
        let transport = TransportFlags(buf[7]);
        let mut src_bytes = [0u8; 8];
        src_bytes.copy_from_slice(&buf[8..16]);
        let mut dst_bytes = [0u8; 8];
        dst_bytes.copy_from_slice(&buf[16..24]);
        let source = Address::new(src_bytes, src_nbits)
            .map_err(|_| ProtoError::MalformedAddress(src_nbits))?;
        let destination = Address::new(dst_bytes, dst_nbits)
            .map_err(|_| ProtoError::MalformedAddress(dst_nbits))?;
        Ok((
            Self {
                message_type,
                hops,
                max_hops,
                sig_algo,
                transport,
                source,
                destination,
            },
            &buf[HEADER_SIZE..],
        ))
    }
}

/// `mgmt_type` sub-header tag (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MgmtType {
    Beacon = 1,
    BeaconReply = 2,
    BeaconGrant = 3,
    TraceReq = 4,
    TraceReply = 5,
    KeyRequest = 6,
}

impl MgmtType {
    pub fn from_u8(v: u8) -> Result<Self, ProtoError> {
        Ok(match v {
            1 => Self::Beacon,
            2 => Self::BeaconReply,
            3 => Self::BeaconGrant,
            4 => Self::TraceReq,
            5 => Self::TraceReply,
            6 => Self::KeyRequest,
            other => return Err(ProtoError::UnknownMgmtType(other)),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeaconBody {
    pub receiver_nonce: [u8; 32],
    pub awake_time_ns: u64,
}

impl BeaconBody {
    pub fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.receiver_nonce);
        out.extend_from_slice(&self.awake_time_ns.to_be_bytes());
    }

    pub fn decode(buf: &[u8]) -> Result<Self, ProtoError> {
        if buf.len() < BEACON_BODY_SIZE {
            return Err(ProtoError::MalformedPacket {
                need: BEACON_BODY_SIZE,
                got: buf.len(),
            });
        }
        let mut receiver_nonce = [0u8; 32];
        receiver_nonce.copy_from_slice(&buf[0..32]);
        let awake_time_ns = u64::from_be_bytes(buf[32..40].try_into().unwrap());
        Ok(Self {
            receiver_nonce,
            awake_time_ns,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeaconReplyBody {
    pub receiver_nonce: [u8; 32],
    pub awake_time_ns: u64,
    pub sender_nonce: [u8; 32],
}

impl BeaconReplyBody {
    pub fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.receiver_nonce);
        out.extend_from_slice(&self.awake_time_ns.to_be_bytes());
        out.extend_from_slice(&self.sender_nonce);
    }

    pub fn decode(buf: &[u8]) -> Result<Self, ProtoError> {
        if buf.len() < BEACON_REPLY_BODY_SIZE {
            return Err(ProtoError::MalformedPacket {
                need: BEACON_REPLY_BODY_SIZE,
                got: buf.len(),
            });
        }
        let base = BeaconBody::decode(buf)?;
        let mut sender_nonce = [0u8; 32];
        sender_nonce.copy_from_slice(&buf[40..72]);
        Ok(Self {
            receiver_nonce: base.receiver_nonce,
            awake_time_ns: base.awake_time_ns,
            sender_nonce,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeaconGrantBody {
    pub receiver_nonce: [u8; 32],
    pub awake_time_ns: u64,
    pub sender_nonce: [u8; 32],
    pub send_time_ns: u64,
}

impl BeaconGrantBody {
    pub fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.receiver_nonce);
        out.extend_from_slice(&self.awake_time_ns.to_be_bytes());
        out.extend_from_slice(&self.sender_nonce);
        out.extend_from_slice(&self.send_time_ns.to_be_bytes());
    }

    pub fn decode(buf: &[u8]) -> Result<Self, ProtoError> {
        if buf.len() < BEACON_GRANT_BODY_SIZE {
            return Err(ProtoError::MalformedPacket {
                need: BEACON_GRANT_BODY_SIZE,
                got: buf.len(),
            });
        }
        let reply = BeaconReplyBody::decode(buf)?;
        let send_time_ns = u64::from_be_bytes(buf[72..80].try_into().unwrap());
        Ok(Self {
            receiver_nonce: reply.receiver_nonce,
            awake_time_ns: reply.awake_time_ns,
            sender_nonce: reply.sender_nonce,
            send_time_ns,
        })
    }
}

/// A management packet's type-specific body. `TraceReq`/`TraceReply`
/// bodies live in [`crate::trace_wire`] since they own a richer, variable
/// length layout; this variant only stores the pre-split raw bytes so that
/// `allnet-proto` does not need to know trace-specific parsing rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MgmtBody {
    Beacon(BeaconBody),
    BeaconReply(BeaconReplyBody),
    BeaconGrant(BeaconGrantBody),
    TraceReq(Vec<u8>),
    TraceReply(Vec<u8>),
    KeyRequest(Vec<u8>),
}

impl MgmtBody {
    pub fn mgmt_type(&self) -> MgmtType {
        match self {
            Self::Beacon(_) => MgmtType::Beacon,
            Self::BeaconReply(_) => MgmtType::BeaconReply,
            Self::BeaconGrant(_) => MgmtType::BeaconGrant,
            Self::TraceReq(_) => MgmtType::TraceReq,
            Self::TraceReply(_) => MgmtType::TraceReply,
            Self::KeyRequest(_) => MgmtType::KeyRequest,
        }
    }

    pub fn encode(&self, out: &mut Vec<u8>) {
        out.push(self.mgmt_type() as u8);
        match self {
            Self::Beacon(b) => b.encode(out),
            Self::BeaconReply(b) => b.encode(out),
            Self::BeaconGrant(b) => b.encode(out),
            Self::TraceReq(bytes) | Self::TraceReply(bytes) | Self::KeyRequest(bytes) => {
                out.extend_from_slice(bytes)
            }
        }
    }

    pub fn decode(buf: &[u8]) -> Result<Self, ProtoError> {
        if buf.is_empty() {
            return Err(ProtoError::MalformedPacket { need: 1, got: 0 });
        }
        let mgmt_type = MgmtType::from_u8(buf[0])?;
        let rest = &buf[1..];
        Ok(match mgmt_type {
            MgmtType::Beacon => Self::Beacon(BeaconBody::decode(rest)?),
            MgmtType::BeaconReply => Self::BeaconReply(BeaconReplyBody::decode(rest)?),
            MgmtType::BeaconGrant => Self::BeaconGrant(BeaconGrantBody::decode(rest)?),
            MgmtType::TraceReq => Self::TraceReq(rest.to_vec()),
            MgmtType::TraceReply => Self::TraceReply(rest.to_vec()),
            MgmtType::KeyRequest => Self::KeyRequest(rest.to_vec()),
        })
    }
}

/// A decoded AllNet packet, tagged by message type, per the "Re-express as
/// explicit parse/emit functions" design note (spec §9): each variant owns
/// its decoded fields rather than a shared flat buffer with pointer
/// arithmetic into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    Clear { header: Header, payload: Vec<u8> },
    Data { header: Header, payload: Vec<u8> },
    Ack { header: Header, acked: Vec<[u8; ID_SIZE]> },
    KeyReq { header: Header, payload: Vec<u8> },
    KeyXchg { header: Header, payload: Vec<u8> },
    Mgmt { header: Header, body: MgmtBody },
}

impl Packet {
    pub fn header(&self) -> &Header {
        match self {
            Self::Clear { header, .. }
            | Self::Data { header, .. }
            | Self::Ack { header, .. }
            | Self::KeyReq { header, .. }
            | Self::KeyXchg { header, .. }
            | Self::Mgmt { header, .. } => header,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        match self {
            Self::Clear { header, payload }
            | Self::Data { header, payload }
            | Self::KeyReq { header, payload }
            | Self::KeyXchg { header, payload } => {
                header.encode(&mut out);
                out.extend_from_slice(payload);
            }
            Self::Ack { header, acked } => {
                header.encode(&mut out);
                for id in acked {
                    out.extend_from_slice(id);
                }
            }
            Self::Mgmt { header, body } => {
                header.encode(&mut out);
                body.encode(&mut out);
            }
        }
        out
    }

    pub fn decode(buf: &[u8]) -> Result<Self, ProtoError> {
        let (header, rest) = Header::decode(buf)?;
        Ok(match header.message_type {
            MessageType::Clear => Self::Clear {
                header,
                payload: rest.to_vec(),
            },
            MessageType::Data => Self::Data {
                header,
                payload: rest.to_vec(),
            },
            MessageType::KeyReq => Self::KeyReq {
                header,
                payload: rest.to_vec(),
            },
            MessageType::KeyXchg => Self::KeyXchg {
                header,
                payload: rest.to_vec(),
            },
            MessageType::Ack => {
                if rest.len() % ID_SIZE != 0 {
                    return Err(ProtoError::InconsistentLength {
                        declared: ID_SIZE,
                        remaining: rest.len(),
                    });
                }
                let acked = rest
                    .chunks_exact(ID_SIZE)
                    .map(|c| c.try_into().unwrap())
                    .collect();
                Self::Ack { header, acked }
            }
            MessageType::Mgmt => Self::Mgmt {
                header,
                body: MgmtBody::decode(rest)?,
            },
        })
    }
}

/// Splits a trailing signature region off `buf`, per spec §3: "preceded by
/// a 2-byte big-endian length". Returns `(body, signature)`; `signature` is
/// `None` when `sig_algo` is [`SigAlgo::None`].
pub fn split_signature(buf: &[u8], sig_algo: SigAlgo) -> Result<(&[u8], Option<&[u8]>), ProtoError> {
    if sig_algo == SigAlgo::None {
        return Ok((buf, None));
    }
    if buf.len() < 2 {
        return Err(ProtoError::MalformedPacket { need: 2, got: buf.len() });
    }
    let ssize = u16::from_be_bytes([buf[buf.len() - 2], buf[buf.len() - 1]]) as usize;
    let total_sig = ssize + 2;
    if total_sig > buf.len() {
        return Err(ProtoError::InconsistentLength {
            declared: total_sig,
            remaining: buf.len(),
        });
    }
    let split_at = buf.len() - total_sig;
    Ok((&buf[..split_at], Some(&buf[split_at..buf.len() - 2])))
}

/// Appends `signature`, length-prefixed, to `out` (inverse of
/// [`split_signature`]).
pub fn append_signature(out: &mut Vec<u8>, signature: &[u8]) {
    out.extend_from_slice(signature);
    out.extend_from_slice(&(signature.len() as u16).to_be_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header(mt: MessageType) -> Header {
        Header {
            message_type: mt,
            hops: 0,
            max_hops: 10,
            sig_algo: SigAlgo::None,
            transport: TransportFlags(TransportFlags::ACK_REQ),
            source: Address::new([1, 2, 3, 4, 0, 0, 0, 0], 32).unwrap(),
            destination: Address::new([5, 6, 0, 0, 0, 0, 0, 0], 16).unwrap(),
        }
    }

    #[test]
    fn header_round_trips() {
        let h = sample_header(MessageType::Data);
        let mut buf = Vec::new();
        h.encode(&mut buf);
        assert_eq!(buf.len(), HEADER_SIZE);
        let (decoded, rest) = Header::decode(&buf).unwrap();
        assert_eq!(decoded, h);
        assert!(rest.is_empty());
    }

    #[test]
    fn short_buffer_is_malformed() {
        let buf = [0u8; HEADER_SIZE - 1];
        assert!(matches!(
            Header::decode(&buf),
            Err(ProtoError::MalformedPacket { .. })
        ));
    }

    #[test]
    fn bad_version_is_rejected() {
        let mut buf = vec![0u8; HEADER_SIZE];
        buf[0] = 9;
        assert!(matches!(
            Header::decode(&buf),
            Err(ProtoError::UnsupportedVersion(9))
        ));
    }

    #[test]
    fn wants_ack_uses_corrected_semantics() {
        assert!(TransportFlags(TransportFlags::ACK_REQ).wants_ack());
        assert!(!TransportFlags(TransportFlags::DO_NOT_CACHE).wants_ack());
        assert!(TransportFlags(TransportFlags::ACK_REQ | TransportFlags::DO_NOT_CACHE).wants_ack());
    }

    #[test]
    fn packet_round_trips_data() {
        let header = sample_header(MessageType::Data);
        let packet = Packet::Data {
            header,
            payload: vec![1, 2, 3, 4, 5],
        };
        let encoded = packet.encode();
        let decoded = Packet::decode(&encoded).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn packet_round_trips_ack() {
        let header = sample_header(MessageType::Ack);
        let packet = Packet::Ack {
            header,
            acked: vec![[7u8; ID_SIZE], [9u8; ID_SIZE]],
        };
        let encoded = packet.encode();
        let decoded = Packet::decode(&encoded).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn mgmt_beacon_round_trips() {
        let header = sample_header(MessageType::Mgmt);
        let body = MgmtBody::Beacon(BeaconBody {
            receiver_nonce: [3u8; 32],
            awake_time_ns: 123_456,
        });
        let packet = Packet::Mgmt { header, body };
        let encoded = packet.encode();
        let decoded = Packet::decode(&encoded).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn signature_splits_and_reassembles() {
        let body = vec![1, 2, 3, 4];
        let sig = vec![0xaa; 64];
        let mut buf = body.clone();
        append_signature(&mut buf, &sig);
        let (split_body, split_sig) = split_signature(&buf, SigAlgo::RsaPkcs1).unwrap();
        assert_eq!(split_body, body.as_slice());
        assert_eq!(split_sig, Some(sig.as_slice()));
    }

    #[test]
    fn no_signature_when_sig_algo_none() {
        let buf = vec![1, 2, 3];
        let (body, sig) = split_signature(&buf, SigAlgo::None).unwrap();
        assert_eq!(body, buf.as_slice());
        assert_eq!(sig, None);
    }
}
