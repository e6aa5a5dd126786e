//! `receive_pipe_message_any` (spec §4.2): demultiplexes over every
//! registered pipe, returning the first ready, fully-framed datagram.
//! Ordering is strictly first-ready-first-returned — no priority
//! reordering happens at this layer (that's `abc`'s job on the send
//! side). A partial read is buffered per-source until a complete frame
//! accumulates; a source that returns EOF or an I/O error is surfaced as
//! closed and dropped from the set, matching the original's "closed pipe
//! is surfaced as -1".

use std::collections::HashMap;
use std::io::Read;
use std::time::Duration;

use mio::{Events, Interest, Poll, Token};

use allnet_proto::constants::PIPE_HEADER_SIZE;
use allnet_proto::pipe::PipeHeader;
use allnet_proto::priority::Priority;

use crate::error::PipeError;

/// Anything `receive_pipe_message_any` can demultiplex over: a readable,
/// pollable byte stream (a local TCP socket, an OS pipe, a Unix socket).
pub trait PipeSource: Read + mio::event::Source + Send {}
impl<T: Read + mio::event::Source + Send> PipeSource for T {}

pub enum PipeEvent {
    Message {
        payload: Vec<u8>,
        priority: Priority,
        token: Token,
    },
    /// The pipe at `token` was closed or failed; it has already been
    /// deregistered and dropped from the set.
    Closed(Token),
}

pub struct PipeSet {
    poll: Poll,
    sources: HashMap<Token, Box<dyn PipeSource>>,
    buffers: HashMap<Token, Vec<u8>>,
    next_token: usize,
}

impl PipeSet {
    pub fn new() -> Result<Self, PipeError> {
        Ok(Self {
            poll: Poll::new()?,
            sources: HashMap::new(),
            buffers: HashMap::new(),
            next_token: 0,
        })
    }

    /// Registers a new pipe and returns the token it will be reported
    /// under.
    pub fn register(&mut self, mut source: Box<dyn PipeSource>) -> Result<Token, PipeError> {
        let token = Token(self.next_token);
        self.next_token += 1;
        self.poll
            .registry()
            .register(&mut *source, token, Interest::READABLE)?;
        self.sources.insert(token, source);
        self.buffers.insert(token, Vec::new());
        Ok(token)
    }

    /// Removes a pipe from the set without trying to read it further.
    pub fn deregister(&mut self, token: Token) -> Result<(), PipeError> {
        let mut source = self.sources.remove(&token).ok_or(PipeError::UnknownToken)?;
        self.poll.registry().deregister(&mut *source)?;
        self.buffers.remove(&token);
        Ok(())
    }

    fn try_extract_message(buf: &mut Vec<u8>) -> Option<(Vec<u8>, Priority)> {
        if buf.len() < PIPE_HEADER_SIZE {
            return None;
        }
        let header = PipeHeader::decode(buf).ok()?;
        let total = PIPE_HEADER_SIZE + header.length as usize;
        if buf.len() < total {
            return None;
        }
        let payload = buf[PIPE_HEADER_SIZE..total].to_vec();
        buf.drain(..total);
        Some((payload, header.priority))
    }

    /// Blocks (with `timeout`, or indefinitely if `None`) until a pipe in
    /// the set becomes ready, returning its first complete framed
    /// message or a closed-pipe notification. Returns `Ok(None)` on
    /// timeout with nothing ready.
    pub fn receive_any(
        &mut self,
        timeout: Option<Duration>,
    ) -> Result<Option<PipeEvent>, PipeError> {
        // A buffer may already hold a complete message from a previous
        // partial read; check those before blocking on poll again.
        let tokens: Vec<Token> = self.buffers.keys().copied().collect();
        for token in tokens {
            if let Some(buf) = self.buffers.get_mut(&token) {
                if let Some((payload, priority)) = Self::try_extract_message(buf) {
                    return Ok(Some(PipeEvent::Message {
                        payload,
                        priority,
                        token,
                    }));
                }
            }
        }

        let mut events = Events::with_capacity(self.sources.len().max(1));
        self.poll.poll(&mut events, timeout)?;

        for event in events.iter() {
            let token = event.token();
            let Some(source) = self.sources.get_mut(&token) else {
                continue;
            };

            // mio registers sources edge-triggered: a single readiness
            // notification can cover more bytes than one `read` call
            // returns (a large packet, or several coalesced ones), and no
            // further notification arrives until the socket is drained.
            // Keep reading into the per-token buffer until the source
            // reports `WouldBlock` (nothing left right now) or closes.
            let mut closed = false;
            loop {
                let mut chunk = [0u8; 4096];
                match source.read(&mut chunk) {
                    Ok(0) => {
                        closed = true;
                        break;
                    }
                    Ok(n) => {
                        let buf = self.buffers.get_mut(&token).expect("buffer for registered token");
                        buf.extend_from_slice(&chunk[..n]);
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                    Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => break,
                    Err(_) => {
                        closed = true;
                        break;
                    }
                }
            }

            if closed {
                self.deregister(token)?;
                return Ok(Some(PipeEvent::Closed(token)));
            }

            let buf = self.buffers.get_mut(&token).expect("buffer for registered token");
            if let Some((payload, priority)) = Self::try_extract_message(buf) {
                return Ok(Some(PipeEvent::Message {
                    payload,
                    priority,
                    token,
                }));
            }
        }
        Ok(None)
    }
}
