//! Error types for bit packing operations.

use std::fmt;

/// Result type for bit packing operations.
pub type BitResult<T> = Result<T, BitError>;

/// Errors that can occur while packing or unpacking bits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BitError {
    /// A flush of the load register would push the byte count past the
    /// buffer capacity.
    BufferExhausted {
        /// Number of bits the caller tried to pack.
        attempted: usize,
        /// Buffer capacity in bytes.
        capacity: usize,
    },

    /// Attempted to unpack past the end of the buffer.
    UnexpectedEof {
        /// Number of bits requested.
        requested: usize,
        /// Number of bits still available.
        available: usize,
    },

    /// Bit count does not fit the operation.
    InvalidBitCount {
        /// The bit count provided.
        bits: usize,
        /// Maximum allowed bits for this operation.
        max_bits: usize,
    },
}

impl fmt::Display for BitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BufferExhausted {
                attempted,
                capacity,
            } => {
                write!(
                    f,
                    "buffer exhausted: cannot pack {attempted} more bits into {capacity} bytes"
                )
            }
            Self::UnexpectedEof {
                requested,
                available,
            } => {
                write!(
                    f,
                    "attempted to unpack {requested} bits but only {available} bits available"
                )
            }
            Self::InvalidBitCount { bits, max_bits } => {
                write!(f, "invalid bit count {bits}, maximum allowed is {max_bits}")
            }
        }
    }
}

impl std::error::Error for BitError {}
