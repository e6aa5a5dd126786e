//! Byte-exact wire codec for the AllNet overlay: packet headers, addresses,
//! priorities, management sub-bodies, and the local pipe-message framing
//! used between daemons and applications.
//!
//! All multi-byte integers on the wire are big-endian. Every decode function
//! validates its input length before touching any byte past the declared
//! size; short or malformed buffers return [`ProtoError`] rather than
//! panicking.

pub mod address;
pub mod chat_wire;
pub mod constants;
pub mod error;
pub mod header;
pub mod key_request_wire;
pub mod pipe;
pub mod priority;
pub mod trace_wire;

pub use address::Address;
pub use chat_wire::{ChatDescriptor, RetransmitRequest, COUNTER_FLAG};
pub use error::ProtoError;
pub use header::{
    BeaconBody, BeaconGrantBody, BeaconReplyBody, Header, MgmtBody, MgmtType, Packet, SigAlgo,
    TransportFlags,
};
pub use key_request_wire::{KeyRequest, KeyRequestReply};
pub use pipe::PipeHeader;
pub use priority::Priority;
pub use trace_wire::{TraceEntry, TraceReply, TraceRequest};

/// Current wire version emitted and required by this codec (see spec §6).
pub const ALLNET_VERSION: u8 = 3;
