//! pmce-stats - permessage-deflate cost estimation.
//!
//! Replays sample traffic, one message per line, through a zlib raw deflate
//! stream configured like a negotiated WebSocket permessage-deflate extension:
//! - Frame header sizes for each message, compressed and uncompressed
//! - Per-message compressed size and time spent in the compressor
//! - Size-weighted compression ratio over the whole run
//! - Memory needed by the compressor and by the peer's decompressor

pub mod app;
pub mod compression;
pub mod config;
pub mod error;
pub mod frame;
pub mod parameters;
pub mod session;
pub mod stats;
pub mod sweep;
pub mod types;
pub mod ui;
