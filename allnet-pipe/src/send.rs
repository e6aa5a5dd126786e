//! `send_pipe_message` / `send_pipe_multiple` (spec §4.2): frame one or
//! more datagrams behind the pipe-message header and write them out in a
//! single call, so the kernel doesn't coalesce a header-then-payload pair
//! of small writes with extra latency.

use std::io::Write;

use allnet_proto::pipe::PipeHeader;
use allnet_proto::priority::Priority;

/// Writes one framed datagram. Returns `false` (the pipe is considered
/// dead) on any write error or short write, matching the original's
/// "short writes kill the connection" contract.
pub fn send_pipe_message(pipe: &mut impl Write, data: &[u8], priority: Priority) -> bool {
    send_pipe_multiple(pipe, &[(data, priority)])
}

/// Frames every `(data, priority)` pair and writes them as one buffer, to
/// avoid per-message small-send latency.
pub fn send_pipe_multiple(pipe: &mut impl Write, messages: &[(&[u8], Priority)]) -> bool {
    let mut buf = Vec::new();
    for (data, priority) in messages {
        let header = PipeHeader {
            length: data.len() as u32,
            priority: *priority,
        };
        buf.extend_from_slice(&header.encode());
        buf.extend_from_slice(data);
    }
    pipe.write_all(&buf).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_pipe_message_writes_header_then_payload() {
        let mut buf: Vec<u8> = Vec::new();
        assert!(send_pipe_message(&mut buf, b"hello", 7));

        let header = PipeHeader::decode(&buf).unwrap();
        assert_eq!(header.length, 5);
        assert_eq!(header.priority, 7);
        assert_eq!(&buf[allnet_proto::constants::PIPE_HEADER_SIZE..], b"hello");
    }

    #[test]
    fn send_pipe_multiple_coalesces_into_one_write() {
        let mut buf: Vec<u8> = Vec::new();
        let messages: Vec<(&[u8], Priority)> = vec![(b"one", 1), (b"two", 2)];
        assert!(send_pipe_multiple(&mut buf, &messages));

        let header1 = PipeHeader::decode(&buf).unwrap();
        assert_eq!(header1.length, 3);
        assert_eq!(header1.priority, 1);
        let offset = allnet_proto::constants::PIPE_HEADER_SIZE + 3;
        let header2 = PipeHeader::decode(&buf[offset..]).unwrap();
        assert_eq!(header2.length, 3);
        assert_eq!(header2.priority, 2);
    }

    struct FailingWriter;
    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(std::io::ErrorKind::BrokenPipe))
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn send_pipe_message_reports_dead_pipe_on_write_failure() {
        let mut dead = FailingWriter;
        assert!(!send_pipe_message(&mut dead, b"x", 1));
    }
}
