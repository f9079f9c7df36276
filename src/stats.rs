//! Aggregation of per-message records into run totals.
//!
//! [`Summary::from_records`] recomputes everything from the record slice on each
//! call, so it can be called any number of times without accumulating twice.

use std::ffi::c_int;
use std::mem;
use std::time::Duration;

use serde::Serialize;

use crate::config::INFLATE_TABLE_ENTRIES;
use crate::parameters::Parameters;
use crate::session::MessageRecord;
use crate::types::{Direction, MemoryScope};

/// Bytes zlib allocates for a deflate state.
#[inline]
#[must_use]
pub const fn deflate_memory(window_bits: i32, memory_level: i32) -> usize {
    (1 << (window_bits + 2)) + (1 << (memory_level + 9))
}

/// Bytes an inflate state needs on a platform whose `int` is `int_size` bytes wide.
#[inline]
#[must_use]
pub const fn inflate_memory(window_bits: i32, int_size: usize) -> usize {
    (1 << window_bits) + INFLATE_TABLE_ENTRIES * 2 * int_size
}

/// Memory estimates derived from the negotiated parameters alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MemoryUsage {
    /// Whether the figure is held for the whole connection or only per message.
    pub scope: MemoryScope,

    /// State this endpoint keeps: deflate when sending, inflate when receiving.
    pub local: usize,

    /// Inflate state a 32-bit peer needs; zero when receiving.
    pub peer_inflate_32: usize,

    /// Inflate state a 64-bit peer needs; zero when receiving.
    pub peer_inflate_64: usize,
}

impl MemoryUsage {
    pub fn for_parameters(params: &Parameters) -> Self {
        let scope = MemoryScope::from_context_takeover(params.context_takeover());
        let window_bits = params.window_bits();

        match params.direction() {
            Direction::Sending => Self {
                scope,
                local: deflate_memory(window_bits, params.memory_level()),
                peer_inflate_32: inflate_memory(window_bits, 4),
                peer_inflate_64: inflate_memory(window_bits, 8),
            },
            Direction::Receiving => Self { scope, local: inflate_memory(window_bits, mem::size_of::<c_int>()), peer_inflate_32: 0, peer_inflate_64: 0 },
        }
    }
}

/// Totals for one simulated connection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub parameters: Parameters,
    pub messages: usize,
    pub total_payload: usize,
    pub total_frame_overhead: usize,
    pub total_compressed_size: usize,
    pub total_compressed_frame_overhead: usize,

    /// Bytes on the wire without compression.
    pub wire_uncompressed: usize,

    /// Bytes on the wire with compression.
    pub wire_compressed: usize,

    /// Frame overhead as a percentage of the uncompressed payload.
    pub frame_overhead_percent: Option<f64>,

    /// Frame overhead as a percentage of the compressed payload.
    pub compressed_frame_overhead_percent: Option<f64>,

    /// Size-weighted ratio `Σcompressed / Σpayload`; `None` when no payload bytes were seen.
    pub ratio: Option<f64>,

    pub elapsed: Duration,
    pub memory: MemoryUsage,
}

impl Summary {
    pub fn from_records(params: &Parameters, records: &[MessageRecord]) -> Self {
        let mut summary = Self {
            parameters: *params,
            messages: records.len(),
            total_payload: 0,
            total_frame_overhead: 0,
            total_compressed_size: 0,
            total_compressed_frame_overhead: 0,
            wire_uncompressed: 0,
            wire_compressed: 0,
            frame_overhead_percent: None,
            compressed_frame_overhead_percent: None,
            ratio: None,
            elapsed: Duration::ZERO,
            memory: MemoryUsage::for_parameters(params),
        };

        for record in records {
            summary.total_payload += record.payload_size;
            summary.total_frame_overhead += record.frame_overhead;
            summary.total_compressed_size += record.compressed_size;
            summary.total_compressed_frame_overhead += record.compressed_frame_overhead;
            summary.elapsed += record.elapsed;
        }

        summary.wire_uncompressed = summary.total_payload + summary.total_frame_overhead;
        summary.wire_compressed = summary.total_compressed_size + summary.total_compressed_frame_overhead;
        summary.frame_overhead_percent = percent(summary.total_frame_overhead, summary.total_payload);
        summary.compressed_frame_overhead_percent = percent(summary.total_compressed_frame_overhead, summary.total_compressed_size);
        summary.ratio = fraction(summary.total_compressed_size, summary.total_payload);
        summary
    }
}

fn fraction(part: usize, whole: usize) -> Option<f64> {
    (whole != 0).then(|| part as f64 / whole as f64)
}

fn percent(part: usize, whole: usize) -> Option<f64> {
    fraction(part, whole).map(|share| share * 100.0)
}
