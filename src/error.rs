//! Block-level parse errors.
//!
//! Extraction as a whole is fail-soft and never surfaces an error to the
//! caller; these values describe why an individual block was rejected so the
//! cluster walker can log the reason and move on.

use thiserror::Error;

/// Why a SimpleBlock or Block payload could not be used.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BlockError {
    /// The block ended before its fixed header was complete.
    #[error("block truncated at offset {offset}")]
    Truncated {
        /// Byte offset of the block data.
        offset: usize,
    },

    /// The track-number VINT was zero, unknown, or unreadable.
    #[error("invalid block track number at offset {offset}")]
    InvalidTrackNumber {
        /// Byte offset of the block data.
        offset: usize,
    },

    /// The block uses lacing, which this engine does not decode.
    #[error("unsupported lacing mode {mode} on track {track}")]
    Lacing {
        /// Lacing mode bits from the block flags (1 = Xiph, 2 = fixed, 3 = EBML).
        mode: u8,
        /// Track the laced block belongs to.
        track: u64,
    },
}
