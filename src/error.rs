//! Error types for the simulation.
//!
//! Parameter errors are raised before any compression work starts; session
//! errors abort the run that raised them. Neither is ever retried.

use std::io;

use thiserror::Error;

/// A negotiated parameter is outside the range zlib and the protocol accept.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParameterError {
    #[error("speed level {0} out of range: must be between 0 (fastest, no compression) and 9 (slowest, best compression). Default is 6")]
    SpeedLevel(i32),

    #[error("window bits {0} out of range: must be between 8 (lower memory usage, worse compression) and 15 (highest memory usage, best compression). Default is 15")]
    WindowBits(i32),

    #[error("memory level {0} out of range: must be between 1 (lower memory usage, worse compression) and 9 (highest memory usage, best compression). Default is 8")]
    MemoryLevel(i32),
}

/// Fatal failure while simulating a connection.
#[derive(Debug, Error)]
pub enum SessionError {
    /// zlib refused the parameter combination.
    #[error("failed to initialize compression context (zlib status {code})")]
    Init {
        /// Status returned by `deflateInit2`.
        code: i32,
    },

    /// The output bound was too small for a message.
    #[error("output buffer of {bound} bytes exhausted while compressing a {message_len} byte message")]
    BufferExhausted {
        /// Bytes reserved for the output.
        bound: usize,
        /// Length of the message being compressed.
        message_len: usize,
    },

    /// `deflate` reported something other than progress.
    #[error("deflate failed (zlib status {code})")]
    Deflate {
        /// Status returned by `deflate`.
        code: i32,
    },

    #[error("compressed output does not end with a flush marker")]
    MissingFlushMarker,

    #[error("message of {0} bytes is too large for a single deflate call")]
    MessageTooLarge(usize),

    #[error("failed to read input: {0}")]
    Io(#[from] io::Error),
}
