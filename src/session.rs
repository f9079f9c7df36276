//! One simulated permessage-deflate connection.
//!
//! A [`Session`] feeds messages through a single [`Deflater`] in order and keeps
//! one [`MessageRecord`] per message. Any error ends the session; the records
//! gathered so far are dropped with it.

use std::io::BufRead;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info};

use crate::compression::Deflater;
use crate::config::EMPTY_MESSAGE_SIZE;
use crate::error::SessionError;
use crate::frame::frame_overhead;
use crate::parameters::Parameters;

/// Measurements taken for a single message.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MessageRecord {
    /// Uncompressed message length.
    pub payload_size: usize,

    /// Frame header bytes if the message were sent uncompressed.
    pub frame_overhead: usize,

    /// Compressed length with the flush marker removed.
    pub compressed_size: usize,

    /// Frame header bytes for the compressed message.
    pub compressed_frame_overhead: usize,

    /// `compressed_size / payload_size`, fixed at 2.0 for empty messages.
    pub ratio: f64,

    /// Time spent inside the compressor.
    pub elapsed: Duration,
}

impl MessageRecord {
    /// Record for a zero-length message, which never reaches the compressor.
    fn empty(masked: bool) -> Self {
        Self {
            payload_size: 0,
            frame_overhead: frame_overhead(masked, 0),
            compressed_size: EMPTY_MESSAGE_SIZE,
            compressed_frame_overhead: frame_overhead(masked, EMPTY_MESSAGE_SIZE),
            ratio: 2.0,
            elapsed: Duration::ZERO,
        }
    }

    fn compressed(masked: bool, payload_size: usize, compressed_size: usize, elapsed: Duration) -> Self {
        Self {
            payload_size,
            frame_overhead: frame_overhead(masked, payload_size),
            compressed_size,
            compressed_frame_overhead: frame_overhead(masked, compressed_size),
            ratio: compressed_size as f64 / payload_size as f64,
            elapsed,
        }
    }
}

/// Simulated connection owning the compression context.
pub struct Session {
    params: Parameters,
    deflater: Deflater,
    records: Vec<MessageRecord>,
}

impl Session {
    /// Opens the compression context for `params`.
    ///
    /// # Errors
    /// Returns [`SessionError::Init`] if zlib rejects the parameters.
    pub fn new(params: Parameters) -> Result<Self, SessionError> {
        let deflater = Deflater::new(&params)?;
        info!(role = %params.role(), direction = %params.direction(), context_takeover = params.context_takeover(), speed_level = params.speed_level(), window_bits = params.window_bits(), memory_level = params.memory_level(), flush = ?deflater.flush_mode(), "compression context ready");

        Ok(Self { params, deflater, records: Vec::new() })
    }

    #[inline]
    pub fn records(&self) -> &[MessageRecord] {
        &self.records
    }

    /// Compresses one message and appends its record.
    ///
    /// # Errors
    /// Propagates any [`SessionError`] from the compressor; the session should not be used
    /// after an error.
    pub fn process_message(&mut self, message: &[u8]) -> Result<&MessageRecord, SessionError> {
        let masked = self.params.masks_frames();

        let record = if message.is_empty() {
            MessageRecord::empty(masked)
        } else {
            let deflated = self.deflater.compress(message)?;
            MessageRecord::compressed(masked, message.len(), deflated.payload.len(), deflated.elapsed)
        };

        debug!(index = self.records.len(), payload = record.payload_size, compressed = record.compressed_size, elapsed_ns = record.elapsed.as_nanos(), "message processed");
        self.records.push(record);

        Ok(&self.records[self.records.len() - 1])
    }

    /// Processes every newline-delimited message from `reader`.
    ///
    /// The newline is not part of the message; a final line without one still counts.
    ///
    /// # Returns
    /// The number of messages processed by this call.
    ///
    /// # Errors
    /// Returns [`SessionError::Io`] on read failure, or the first compression error.
    pub fn process_lines<R: BufRead>(&mut self, mut reader: R) -> Result<usize, SessionError> {
        let mut line = Vec::new();
        let mut processed = 0;

        loop {
            line.clear();
            if reader.read_until(b'\n', &mut line)? == 0 {
                break;
            }
            if line.last() == Some(&b'\n') {
                line.pop();
            }

            self.process_message(&line)?;
            processed += 1;
        }

        info!(messages = processed, "input exhausted");
        Ok(processed)
    }

    /// Ends the session, releasing the compression context.
    pub fn finish(self) -> Vec<MessageRecord> {
        self.records
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn session(tokens: &[&str]) -> Session {
        Session::new(Parameters::from_tokens(tokens).unwrap()).unwrap()
    }

    fn compressed_sizes(tokens: &[&str], messages: &[&[u8]]) -> Vec<usize> {
        let mut session = session(tokens);
        for message in messages {
            session.process_message(message).unwrap();
        }
        session.finish().iter().map(|record| record.compressed_size).collect()
    }

    #[test]
    fn test_scenario_with_defaults() {
        let input = "hello world\n\naaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa\n";
        let mut session = session(&[]);

        assert_eq!(session.process_lines(Cursor::new(input)).unwrap(), 3);

        let records = session.finish();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].payload_size, 11);
        assert_eq!(records[1].payload_size, 0);
        assert_eq!(records[1].compressed_size, 2);
        assert_eq!(records[2].payload_size, 32);
        assert!(records[2].compressed_size < 32);
    }

    #[test]
    fn test_empty_message_is_fixed() {
        for tokens in [&[][..], &["context_takeover=false", "speed_level=0"][..], &["server=false", "window_bits=9", "memory_level=1"][..]] {
            let mut session = session(tokens);
            let record = *session.process_message(b"").unwrap();

            assert_eq!(record.compressed_size, 2);
            assert!((record.ratio - 2.0).abs() < f64::EPSILON);
            assert_eq!(record.elapsed, Duration::ZERO);
        }
    }

    #[test]
    fn test_frame_overhead_follows_masking() {
        let mut server = session(&[]);
        let record = *server.process_message(b"abc").unwrap();
        assert_eq!(record.frame_overhead, 2);
        assert_eq!(record.compressed_frame_overhead, 2);

        let mut client = session(&["server=false"]);
        let record = *client.process_message(&[b'z'; 200]).unwrap();
        assert_eq!(record.frame_overhead, 8);
        assert_eq!(record.compressed_frame_overhead, 6);
    }

    #[test]
    fn test_ratio_per_message() {
        let mut session = session(&[]);
        let record = *session.process_message(&[b'q'; 1000]).unwrap();

        let expected = record.compressed_size as f64 / 1000.0;
        assert!((record.ratio - expected).abs() < f64::EPSILON);
        assert!(record.ratio < 0.1);
    }

    #[test]
    fn test_takeover_runs_are_deterministic() {
        let messages: &[&[u8]] = &[b"{\"op\":\"subscribe\",\"channel\":\"trades\"}", b"{\"op\":\"subscribe\",\"channel\":\"quotes\"}", b"", b"{\"op\":\"unsubscribe\",\"channel\":\"trades\"}"];

        assert_eq!(compressed_sizes(&[], messages), compressed_sizes(&[], messages));
    }

    #[test]
    fn test_no_takeover_sizes_ignore_order() {
        let forward: &[&[u8]] = &[b"GET /api/v1/orders?limit=50", b"GET /api/v1/orders?limit=50&offset=50", b"POST /api/v1/orders {\"qty\":3}"];
        let reversed: Vec<&[u8]> = forward.iter().rev().copied().collect();

        let tokens = &["context_takeover=false"];
        let mut forward_sizes = compressed_sizes(tokens, forward);
        forward_sizes.reverse();

        assert_eq!(forward_sizes, compressed_sizes(tokens, &reversed));
    }

    #[test]
    fn test_takeover_sizes_depend_on_order() {
        let messages: &[&[u8]] = &[b"a fairly unique sentence about permessage deflate", b"a fairly unique sentence about permessage deflate!"];

        let with_history = compressed_sizes(&[], messages);
        let without_history = compressed_sizes(&["context_takeover=false"], messages);

        assert_eq!(with_history[0], without_history[0]);
        assert!(with_history[1] < without_history[1]);
    }

    #[test]
    fn test_lines_without_trailing_newline() {
        let mut session = session(&[]);
        assert_eq!(session.process_lines(Cursor::new("first\nsecond")).unwrap(), 2);
        assert_eq!(session.records()[1].payload_size, 6);

        let mut session = self::session(&[]);
        assert_eq!(session.process_lines(Cursor::new("")).unwrap(), 0);
        assert!(session.records().is_empty());
    }

    #[test]
    fn test_carriage_return_is_payload() {
        let mut session = session(&[]);
        session.process_lines(Cursor::new("ping\r\n")).unwrap();
        assert_eq!(session.records()[0].payload_size, 5);
    }

    #[test]
    fn test_non_utf8_input() {
        let mut session = session(&[]);
        assert_eq!(session.process_lines(Cursor::new(vec![0xff, 0xfe, b'\n', 0x80])).unwrap(), 2);
    }
}
