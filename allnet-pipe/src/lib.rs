//! Pipe-message framing over byte streams, and a multi-source blocking
//! receive with timeout (spec §4.2): the transport glue between AllNet
//! daemons and the applications/sockets talking to them. Priority
//! ordering is `abc`'s job on the send side; this crate only frames and
//! demultiplexes, strictly first-ready-first-returned (spec §5).

pub mod error;
pub mod receive;
pub mod send;

pub use error::PipeError;
pub use receive::{PipeEvent, PipeSet, PipeSource};
pub use send::{send_pipe_message, send_pipe_multiple};
