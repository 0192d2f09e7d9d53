//! Error types for the screen model
//!
//! Terminal mutators never fail outward: they clamp, report and continue.
//! The fallible building blocks (buffer access, surface growth) return
//! [`Result`] so callers can decide how to recover.

use std::sync::atomic::{AtomicU32, Ordering};

use thiserror::Error;

/// Maximum number of diagnostics emitted before going quiet
pub const MAX_REPORTED_ERRORS: u32 = 100;

static REPORTED: AtomicU32 = AtomicU32::new(0);

/// Errors raised by the screen model
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("row limit reached: requested {requested} rows, limit is {limit}")]
    RowLimit { requested: usize, limit: usize },

    #[error("failed to reserve room for {0} more elements")]
    Alloc(usize),

    #[error("index {index} out of bounds (length {len})")]
    OutOfBounds { index: usize, len: usize },

    #[error("buffer is empty")]
    Empty,
}

/// Result type for screen model operations
pub type Result<T> = std::result::Result<T, Error>;

/// Log a recoverable error, rate-limited to [`MAX_REPORTED_ERRORS`] per process.
pub fn report(err: &Error) {
    let seen = REPORTED.fetch_add(1, Ordering::Relaxed);
    if seen < MAX_REPORTED_ERRORS {
        log::warn!("{}", err);
    } else if seen == MAX_REPORTED_ERRORS {
        log::warn!("too many errors, further diagnostics suppressed");
    }
}
