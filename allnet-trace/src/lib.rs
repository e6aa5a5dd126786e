//! The trace protocol (spec §4.9): a request/response tree traversal
//! across the overlay with nonce-based loop suppression and intermediate
//! replies. Responder logic lives in [`responder`]; the client-side
//! request builder and RTT correlation in [`client`].

pub mod cache;
pub mod client;
pub mod error;
pub mod reply_crypto;
pub mod responder;

pub use cache::TraceCache;
pub use client::{build_request, random_source_address, TraceClient, CLIENT_TIMEOUT};
pub use error::TraceError;
pub use reply_crypto::encrypt_reply_if_requested;
pub use responder::{respond_to_trace, RespondOutcome, ResponderMode, TraceContext};
