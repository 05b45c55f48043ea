//! Error types for header framing.

use std::fmt;

use bitstream::BitError;

/// Result type for header framing operations.
pub type WireResult<T> = Result<T, WireError>;

/// Errors raised while framing or parsing group and patch headers.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum WireError {
    /// Underlying bit packer failure.
    Bitstream(BitError),

    /// Group header announced a patch edge length the codec cannot hold.
    InvalidPatchSize { size: u8, max: u8 },
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bitstream(err) => write!(f, "bitstream error: {err}"),
            Self::InvalidPatchSize { size, max } => {
                write!(f, "invalid patch size {size}, expected 1..={max}")
            }
        }
    }
}

impl std::error::Error for WireError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Bitstream(err) => Some(err),
            Self::InvalidPatchSize { .. } => None,
        }
    }
}

impl From<BitError> for WireError {
    fn from(err: BitError) -> Self {
        Self::Bitstream(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_patch_size_display() {
        let err = WireError::InvalidPatchSize { size: 0, max: 32 };
        let msg = err.to_string();
        assert!(msg.contains("invalid patch size 0"));
        assert!(msg.contains("32"));
    }

    #[test]
    fn bitstream_error_converts() {
        let err: WireError = BitError::UnexpectedEof {
            requested: 8,
            available: 0,
        }
        .into();
        assert!(matches!(err, WireError::Bitstream(_)));
        assert!(err.to_string().contains("bitstream error"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
