//! Error types for patch codec operations.

use std::fmt;

use crate::session::SessionState;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while coding or decoding patches.
///
/// `InvalidBitWidth`, `InvalidQuantizationIndex`, `ReservedQuantWbits` and
/// `InvalidPrequant` can only be produced on the encoding side and point to
/// a quantization tuning bug; the remaining variants can be triggered by
/// received data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Header framing error.
    Wire(wire::WireError),

    /// Bitstream error.
    Bitstream(bitstream::BitError),

    /// Word width needed by a patch is outside `[2, 17]`.
    InvalidBitWidth { wbits: u32 },

    /// `postquant` is larger than the patch area.
    InvalidQuantizationIndex { postquant: usize, area: usize },

    /// Adaptive `quant_wbits` collided with the end-of-patches sentinel.
    ReservedQuantWbits { quant_wbits: u8 },

    /// Pre-quantization exponent outside `[2, 17]`.
    InvalidPrequant { prequant: u8 },

    /// Operation called in a session state that does not allow it.
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },

    /// Coefficient slice does not match the group's patch area.
    PatchLengthMismatch { expected: usize, actual: usize },

    /// Sample grid is too small for the patch size and stride.
    GridTooSmall { needed: usize, available: usize },
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wire(e) => write!(f, "wire error: {e}"),
            Self::Bitstream(e) => write!(f, "bitstream error: {e}"),
            Self::InvalidBitWidth { wbits } => {
                write!(
                    f,
                    "bits needed per word ({wbits}) out of range 2..=17, adjust quantization"
                )
            }
            Self::InvalidQuantizationIndex { postquant, area } => {
                write!(f, "postquant {postquant} exceeds patch area {area}")
            }
            Self::ReservedQuantWbits { quant_wbits } => {
                write!(
                    f,
                    "quant_wbits {quant_wbits} collides with the end-of-patches sentinel"
                )
            }
            Self::InvalidPrequant { prequant } => {
                write!(f, "prequant {prequant} out of range 2..=17")
            }
            Self::InvalidState { operation, state } => {
                write!(f, "{operation} not allowed in session state {state:?}")
            }
            Self::PatchLengthMismatch { expected, actual } => {
                write!(
                    f,
                    "patch length mismatch: expected {expected} coefficients, got {actual}"
                )
            }
            Self::GridTooSmall { needed, available } => {
                write!(
                    f,
                    "sample grid too small: need {needed} samples, have {available}"
                )
            }
        }
    }
}

impl std::error::Error for CodecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Wire(e) => Some(e),
            Self::Bitstream(e) => Some(e),
            _ => None,
        }
    }
}

impl From<wire::WireError> for CodecError {
    fn from(err: wire::WireError) -> Self {
        Self::Wire(err)
    }
}

impl From<bitstream::BitError> for CodecError {
    fn from(err: bitstream::BitError) -> Self {
        Self::Bitstream(err)
    }
}

impl CodecError {
    /// Returns `true` if the error was caused by running out of input or
    /// output space rather than by a logic error.
    #[must_use]
    pub const fn is_buffer_error(&self) -> bool {
        matches!(
            self,
            Self::Bitstream(
                bitstream::BitError::BufferExhausted { .. }
                    | bitstream::BitError::UnexpectedEof { .. }
            ) | Self::Wire(wire::WireError::Bitstream(
                bitstream::BitError::BufferExhausted { .. }
                    | bitstream::BitError::UnexpectedEof { .. }
            ))
        )
    }
}
