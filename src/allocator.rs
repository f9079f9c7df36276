//! Memory Allocator Configuration
//!
//! The binary runs on mimalloc. The zlib state allocated by the compression
//! context goes through the Rust global allocator as well, so both the
//! message buffers and the deflate window come from the same heap.

use mimalloc::MiMalloc;

/// Global memory allocator instance using mimalloc
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;
