//! Parameter grid runs over a fixed message set.
//!
//! A sweep replays the same messages through one fresh [`Session`] per grid point,
//! with and without context takeover, across every window size and memory level.
//! Role, direction and speed level stay as configured.

use std::io::{self, BufRead};

use anyhow::{Context, Result};
use tracing::info;

use crate::config::{SWEEP_MEMORY_LEVELS, SWEEP_WINDOW_BITS};
use crate::parameters::Parameters;
use crate::session::Session;
use crate::stats::Summary;

/// Reads newline-delimited messages into memory so they can be replayed.
///
/// # Errors
/// Returns the underlying I/O error.
pub fn read_messages<R: BufRead>(reader: R) -> io::Result<Vec<Vec<u8>>> {
    reader.split(b'\n').collect()
}

/// Lists the grid points of a sweep, takeover first, then window bits, then memory level.
///
/// # Errors
/// Returns an error only if the grid constants fall outside the accepted ranges.
pub fn grid(base: &Parameters) -> Result<Vec<Parameters>> {
    let mut points = Vec::new();
    for context_takeover in [true, false] {
        for window_bits in SWEEP_WINDOW_BITS {
            for memory_level in SWEEP_MEMORY_LEVELS {
                points.push(base.with_grid_point(context_takeover, window_bits, memory_level)?);
            }
        }
    }

    Ok(points)
}

/// Runs every grid point over `messages`, calling `on_point` after each one.
///
/// # Errors
/// Stops at the first grid point whose session fails.
pub fn run<F: FnMut(&Summary)>(base: &Parameters, messages: &[Vec<u8>], mut on_point: F) -> Result<Vec<Summary>> {
    let points = grid(base)?;
    info!(points = points.len(), messages = messages.len(), "starting sweep");

    let mut summaries = Vec::with_capacity(points.len());
    for params in points {
        let point = format!("context_takeover={} window_bits={} memory_level={}", params.context_takeover(), params.window_bits(), params.memory_level());

        let mut session = Session::new(params).with_context(|| point.clone())?;
        for message in messages {
            session.process_message(message).with_context(|| point.clone())?;
        }

        let summary = Summary::from_records(&params, &session.finish());
        on_point(&summary);
        summaries.push(summary);
    }

    Ok(summaries)
}
