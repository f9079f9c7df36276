//! Global Configuration Constants
//!
//! Defaults and accepted ranges for the negotiated permessage-deflate
//! parameters, plus the fixed figures used by the frame and memory models.

use std::ops::RangeInclusive;

/// Application name used in reports and help output
pub const APP_NAME: &str = "pmce-stats";

// === Negotiated Parameter Defaults ===
// These mirror what a permessage-deflate endpoint offers when nothing else is negotiated.

/// Default role of the simulated endpoint (server)
pub const DEFAULT_SERVER: bool = true;

/// Default direction of the simulated traffic (sending)
pub const DEFAULT_SENDING: bool = true;

/// Default context takeover setting
///
/// Keeping the compression context between messages is the protocol default;
/// disabling it matches negotiating `*_no_context_takeover`.
pub const DEFAULT_CONTEXT_TAKEOVER: bool = true;

/// Default zlib compression level
pub const DEFAULT_SPEED_LEVEL: i32 = 6;

/// Default base 2 logarithm of the LZ77 window
pub const DEFAULT_WINDOW_BITS: i32 = 15;

/// Default zlib memory level
pub const DEFAULT_MEMORY_LEVEL: i32 = 8;

// === Accepted Ranges ===

/// Compression levels accepted by zlib; 0 stores without compressing
pub const SPEED_LEVEL_RANGE: RangeInclusive<i32> = 0..=9;

/// Window sizes that may be negotiated through `*_max_window_bits`
pub const WINDOW_BITS_RANGE: RangeInclusive<i32> = 8..=15;

/// Memory levels accepted by zlib
pub const MEMORY_LEVEL_RANGE: RangeInclusive<i32> = 1..=9;

/// Window sizes covered by a sweep
///
/// Current zlib releases refuse an 8-bit window for raw streams, so the grid starts at 9.
pub const SWEEP_WINDOW_BITS: RangeInclusive<i32> = 9..=15;

/// Memory levels covered by a sweep
pub const SWEEP_MEMORY_LEVELS: RangeInclusive<i32> = MEMORY_LEVEL_RANGE;

// === Framing and Compression Constants ===

/// Largest payload that fits the 7-bit length field
pub const SHORT_PAYLOAD_MAX: usize = 125;

/// Largest payload that fits the 16-bit extended length field
pub const MEDIUM_PAYLOAD_MAX: usize = 0xFFFF;

/// Size of the masking key carried by client-to-server frames
pub const MASK_KEY_SIZE: usize = 4;

/// Marker emitted by a sync or full flush, stripped before the payload goes on the wire
pub const FLUSH_MARKER: [u8; 4] = [0x00, 0x00, 0xFF, 0xFF];

/// Size recorded for an empty message, the two bytes of an empty deflate block
pub const EMPTY_MESSAGE_SIZE: usize = 2;

/// Headroom added to `deflateBound` for the flush marker
///
/// zlib asks for at least six free bytes of output when flushing.
pub const FLUSH_ALLOWANCE: usize = 6;

/// Code table entries counted per inflate state by the memory estimate
pub const INFLATE_TABLE_ENTRIES: usize = 1440;
