//! Error types for layer dispatch.

use std::fmt;

use codec::CodecError;

/// Result type for region decompressors.
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Errors raised while decoding a layer packet into a region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// Patch codec error.
    Codec(CodecError),

    /// Patch position lies outside the region.
    PatchOutOfRange {
        x: u32,
        y: u32,
        patches_per_edge: u32,
    },

    /// Group patch size does not match the destination layer.
    PatchSizeMismatch { expected: u8, found: u8 },

    /// Group holds more patches than the configured limit.
    TooManyPatches { limit: usize },

    /// End of patches where a patch body was required.
    MissingPatch,
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Codec(e) => write!(f, "codec error: {e}"),
            Self::PatchOutOfRange {
                x,
                y,
                patches_per_edge,
            } => {
                write!(
                    f,
                    "patch ({x}, {y}) outside region of {patches_per_edge} patches per edge"
                )
            }
            Self::PatchSizeMismatch { expected, found } => {
                write!(f, "patch size mismatch: expected {expected}, found {found}")
            }
            Self::TooManyPatches { limit } => {
                write!(f, "group exceeds {limit} patches")
            }
            Self::MissingPatch => write!(f, "end of patches before a required patch"),
        }
    }
}

impl std::error::Error for DispatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Codec(e) => Some(e),
            _ => None,
        }
    }
}

impl From<CodecError> for DispatchError {
    fn from(err: CodecError) -> Self {
        Self::Codec(err)
    }
}
