//! WebSocket frame header size model.

use crate::config::{MASK_KEY_SIZE, MEDIUM_PAYLOAD_MAX, SHORT_PAYLOAD_MAX};

/// Returns the number of header bytes a single frame carrying `payload_size` bytes needs.
///
/// The length field grows from 7 bits to 16 and then 64 bits; masked frames carry a
/// 4-byte key on top of that.
#[inline]
#[must_use]
pub const fn frame_overhead(masked: bool, payload_size: usize) -> usize {
    let length = if payload_size <= SHORT_PAYLOAD_MAX {
        2
    } else if payload_size <= MEDIUM_PAYLOAD_MAX {
        4
    } else {
        8
    };

    if masked { length + MASK_KEY_SIZE } else { length }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_length_field_boundaries() {
        assert_eq!(frame_overhead(false, 0), 2);
        assert_eq!(frame_overhead(false, 125), 2);
        assert_eq!(frame_overhead(false, 126), 4);
        assert_eq!(frame_overhead(false, 65535), 4);
        assert_eq!(frame_overhead(false, 65536), 8);
    }

    #[test]
    fn test_masked_frames() {
        assert_eq!(frame_overhead(true, 0), 6);
        assert_eq!(frame_overhead(true, 125), 6);
        assert_eq!(frame_overhead(true, 65535), 8);
        assert_eq!(frame_overhead(true, 65536), 12);
    }

    proptest! {
        #[test]
        fn unmasked_overhead_is_a_length_field(size in 0usize..1 << 24) {
            prop_assert!(matches!(frame_overhead(false, size), 2 | 4 | 8));
        }

        #[test]
        fn masking_adds_the_key(size in 0usize..1 << 24) {
            prop_assert_eq!(frame_overhead(true, size), frame_overhead(false, size) + 4);
        }

        #[test]
        fn overhead_never_shrinks(size in 0usize..1 << 24) {
            prop_assert!(frame_overhead(false, size) <= frame_overhead(false, size + 1));
        }
    }
}
