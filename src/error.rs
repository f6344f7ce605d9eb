//! Error types for puzgraphs
//!
//! Only conditions a caller can sensibly react to are errors. Malformed input
//! (indices out of range, unsorted edge lists, a `k` that does not divide the
//! grid area, an unbounded augmenting path) is a programming mistake and panics.

use std::collections::TryReserveError;

use thiserror::Error;

/// Result type alias using puzgraphs' Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in puzgraphs operations
#[derive(Error, Debug)]
pub enum Error {
    /// Scratch space for an algorithm could not be reserved
    #[error("Failed to allocate scratch space: {0}")]
    OutOfMemory(#[from] TryReserveError),

    /// The divvy generator hit its configured attempt limit
    #[error("Could not divide a {width}x{height} rectangle into {k}-ominoes within {attempts} attempts")]
    DivvyExhausted {
        /// Width of the rectangle
        width: u32,
        /// Height of the rectangle
        height: u32,
        /// Requested omino size
        k: u32,
        /// Number of attempts made
        attempts: u64,
    },
}
