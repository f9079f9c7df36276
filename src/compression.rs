//! Raw deflate stream backed by zlib.
//!
//! [`Deflater`] owns one `z_stream` for the lifetime of a simulated connection.
//! Every message is compressed by a single `deflate` call that ends in a sync or
//! full flush, and the trailing flush marker is removed the way permessage-deflate
//! strips it before framing.

use std::alloc::{self, Layout};
use std::ffi::{c_int, c_void};
use std::mem;
use std::ptr;
use std::time::{Duration, Instant};

use libz_sys::{Z_DEFAULT_STRATEGY, Z_DEFLATED, Z_FULL_FLUSH, Z_OK, Z_SYNC_FLUSH, uInt, uLong, voidpf, z_stream};

use crate::config::{FLUSH_ALLOWANCE, FLUSH_MARKER};
use crate::error::SessionError;
use crate::parameters::Parameters;

/// Flush performed at the end of every message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushMode {
    /// Emit everything and keep the sliding window (context takeover).
    Sync,
    /// Emit everything and forget the sliding window (no context takeover).
    Full,
}

impl FlushMode {
    #[inline]
    pub fn from_context_takeover(context_takeover: bool) -> Self {
        if context_takeover { Self::Sync } else { Self::Full }
    }
}

impl From<FlushMode> for c_int {
    fn from(mode: FlushMode) -> Self {
        match mode {
            FlushMode::Sync => Z_SYNC_FLUSH,
            FlushMode::Full => Z_FULL_FLUSH,
        }
    }
}

/// Output of compressing one message.
pub struct Deflated<'a> {
    /// Bytes that would go on the wire, flush marker removed.
    pub payload: &'a [u8],

    /// Wall time spent inside `deflate`.
    pub elapsed: Duration,
}

/// Persistent raw deflate context.
///
/// The stream is boxed because zlib keeps a pointer back to it; it never moves after
/// initialization and is released with `deflateEnd` when the value is dropped.
pub struct Deflater {
    stream: Box<z_stream>,
    flush: FlushMode,
    output: Vec<u8>,
}

impl Deflater {
    /// Opens a raw deflate stream for the negotiated parameters.
    ///
    /// The window size is passed negated, which selects zlib's header-less format.
    ///
    /// # Errors
    /// Returns [`SessionError::Init`] when zlib rejects the parameter combination.
    pub fn new(params: &Parameters) -> Result<Self, SessionError> {
        let mut stream = Box::new(blank_stream());

        // SAFETY: `stream` is a fully initialized z_stream with valid allocator callbacks,
        // and the version/size pair describes the z_stream type libz-sys was built against.
        let code = unsafe {
            libz_sys::deflateInit2_(
                &mut *stream,
                params.speed_level(),
                Z_DEFLATED,
                -params.window_bits(),
                params.memory_level(),
                Z_DEFAULT_STRATEGY,
                libz_sys::zlibVersion(),
                mem::size_of::<z_stream>() as c_int,
            )
        };

        if code != Z_OK {
            return Err(SessionError::Init { code });
        }

        Ok(Self { stream, flush: FlushMode::from_context_takeover(params.context_takeover()), output: Vec::new() })
    }

    #[inline]
    pub fn flush_mode(&self) -> FlushMode {
        self.flush
    }

    /// Upper bound on the output of compressing `len` bytes in one call.
    ///
    /// `deflateBound` covers the compressed blocks but not the marker a flush appends.
    pub fn output_bound(&mut self, len: usize) -> usize {
        let source_len = uLong::try_from(len).unwrap_or(uLong::MAX);

        // SAFETY: the stream was initialized by deflateInit2_ and is still open.
        let bound = unsafe { libz_sys::deflateBound(&mut *self.stream, source_len) };

        usize::try_from(bound).unwrap_or(usize::MAX).saturating_add(FLUSH_ALLOWANCE)
    }

    /// Compresses one non-empty message with a single `deflate` call.
    ///
    /// # Errors
    /// - [`SessionError::MessageTooLarge`] if the message or its bound does not fit zlib's counters
    /// - [`SessionError::Deflate`] if zlib reports an error
    /// - [`SessionError::BufferExhausted`] if the output bound turned out too small
    /// - [`SessionError::MissingFlushMarker`] if the output does not end with the flush marker
    pub fn compress(&mut self, message: &[u8]) -> Result<Deflated<'_>, SessionError> {
        let bound = self.output_bound(message.len());
        let avail_in = uInt::try_from(message.len()).map_err(|_| SessionError::MessageTooLarge(message.len()))?;
        let avail_out = uInt::try_from(bound).map_err(|_| SessionError::MessageTooLarge(message.len()))?;

        if self.output.len() < bound {
            self.output.resize(bound, 0);
        }

        self.stream.next_in = message.as_ptr().cast_mut();
        self.stream.avail_in = avail_in;
        self.stream.next_out = self.output.as_mut_ptr();
        self.stream.avail_out = avail_out;

        let started = Instant::now();
        // SAFETY: next_in/next_out point at live buffers of at least avail_in/avail_out bytes;
        // zlib never writes through next_in.
        let code = unsafe { libz_sys::deflate(&mut *self.stream, self.flush.into()) };
        let elapsed = started.elapsed();

        let remaining_in = self.stream.avail_in;
        let remaining_out = self.stream.avail_out;
        self.stream.next_in = ptr::null_mut();
        self.stream.avail_in = 0;
        self.stream.next_out = ptr::null_mut();
        self.stream.avail_out = 0;

        if code != Z_OK {
            return Err(SessionError::Deflate { code });
        }
        if remaining_out == 0 || remaining_in != 0 {
            return Err(SessionError::BufferExhausted { bound, message_len: message.len() });
        }

        let produced = bound - remaining_out as usize;
        let payload = self.output[..produced].strip_suffix(&FLUSH_MARKER).ok_or(SessionError::MissingFlushMarker)?;

        Ok(Deflated { payload, elapsed })
    }
}

impl Drop for Deflater {
    fn drop(&mut self) {
        // SAFETY: the stream was initialized by deflateInit2_; deflateEnd frees its state
        // exactly once because the Deflater is dropped exactly once.
        unsafe {
            libz_sys::deflateEnd(&mut *self.stream);
        }
    }
}

fn blank_stream() -> z_stream {
    z_stream {
        next_in: ptr::null_mut(),
        avail_in: 0,
        total_in: 0,
        next_out: ptr::null_mut(),
        avail_out: 0,
        total_out: 0,
        msg: ptr::null_mut(),
        state: ptr::null_mut(),
        zalloc,
        zfree,
        opaque: ptr::null_mut(),
        data_type: 0,
        adler: 0,
        reserved: 0,
    }
}

const ALIGN: usize = mem::align_of::<usize>();

/// zlib allocation callback routed through the Rust global allocator.
///
/// The block size is stored in a header word so `zfree` can rebuild the layout.
unsafe extern "C" fn zalloc(_opaque: voidpf, items: uInt, item_size: uInt) -> voidpf {
    let Some(size) = (items as usize).checked_mul(item_size as usize).and_then(|size| size.checked_add(mem::size_of::<usize>())) else {
        return ptr::null_mut();
    };
    let Ok(layout) = Layout::from_size_align(size, ALIGN) else {
        return ptr::null_mut();
    };

    // SAFETY: layout has a non-zero size (at least one header word).
    unsafe {
        let header = alloc::alloc(layout).cast::<usize>();
        if header.is_null() {
            return ptr::null_mut();
        }
        header.write(size);
        header.add(1).cast::<c_void>()
    }
}

/// zlib release callback matching [`zalloc`].
unsafe extern "C" fn zfree(_opaque: voidpf, address: voidpf) {
    if address.is_null() {
        return;
    }

    // SAFETY: address was returned by zalloc, so the header word precedes it and holds
    // the size of the original allocation.
    unsafe {
        let header = address.cast::<usize>().sub(1);
        let size = header.read();
        alloc::dealloc(header.cast::<u8>(), Layout::from_size_align_unchecked(size, ALIGN));
    }
}
