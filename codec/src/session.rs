//! Patch codec session state machine.
//!
//! A [`CodecSession`] carries the group parameters (patch size, current word
//! width) between calls. It is owned by one encode or decode job, so
//! independent packets can be processed on different threads with no
//! shared state.
//!
//! ```text
//!            group header           patch header
//!   Idle ───────────────► GroupOpen ────────────► PatchOpen
//!                          ▲   │                    │
//!                          │   │ end of patches     │ patch body
//!                          │   ▼                    │
//!                          │  Closed                │
//!                          └────────────────────────┘
//! ```
//!
//! A new group header may start from `Idle`, `GroupOpen` or `Closed`.

use bitstream::BitPacker;
use wire::{GroupHeader, PatchHeader, LARGE_PATCH_SIZE};

use crate::error::{CodecError, CodecResult};
use crate::patch::{decode_coefficients, encode_coefficients, word_bits_for};

/// Where a session is within a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No group header seen yet.
    #[default]
    Idle,
    /// Group header seen; a patch header or the sentinel comes next.
    GroupOpen,
    /// Patch header seen; the patch body comes next.
    PatchOpen,
    /// End of patches seen.
    Closed,
}

/// Per-job patch codec state.
#[derive(Debug, Clone, Default)]
pub struct CodecSession {
    state: SessionState,
    group: Option<GroupHeader>,
    word_bits: u8,
}

impl CodecSession {
    /// Creates an idle session.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: SessionState::Idle,
            group: None,
            word_bits: 0,
        }
    }

    /// Creates a session positioned just after `header`, for callers that
    /// framed the group header themselves.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Wire`] if the patch size is outside `1..=32`.
    pub fn for_group(header: &GroupHeader) -> CodecResult<Self> {
        let mut session = Self::new();
        session.open_group(header)?;
        Ok(session)
    }

    /// Returns the current state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Returns the header of the current group, if any.
    #[must_use]
    pub const fn group(&self) -> Option<&GroupHeader> {
        self.group.as_ref()
    }

    /// Returns the patch edge length of the current group, or 0.
    #[must_use]
    pub fn patch_size(&self) -> u8 {
        self.group.map_or(0, |g| g.patch_size)
    }

    /// Returns the number of coefficients per patch, or 0.
    #[must_use]
    pub fn patch_area(&self) -> usize {
        self.group.map_or(0, |g| g.patch_area())
    }

    /// Returns the magnitude width of the current patch.
    #[must_use]
    pub const fn word_bits(&self) -> u8 {
        self.word_bits
    }

    /// Returns the session to `Idle`.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Writes a group header and opens the group.
    ///
    /// # Errors
    ///
    /// Fails on a bad patch size, a full packer, or if a patch is open.
    pub fn code_group_header(
        &mut self,
        packer: &mut BitPacker,
        header: &GroupHeader,
    ) -> CodecResult<()> {
        self.expect_group_boundary("code_group_header")?;
        check_patch_size(header.patch_size)?;
        wire::encode_group_header(header, packer)?;
        self.open_group(header)
    }

    /// Reads a group header and opens the group.
    ///
    /// # Errors
    ///
    /// Fails on a bad patch size, exhausted input, or if a patch is open.
    pub fn decode_group_header(&mut self, packer: &mut BitPacker) -> CodecResult<GroupHeader> {
        self.expect_group_boundary("decode_group_header")?;
        let header = wire::decode_group_header(packer)?;
        self.open_group(&header)?;
        Ok(header)
    }

    /// Chooses the word width for `patch`, folds it into
    /// `header.quant_wbits` and writes the header.
    ///
    /// The high nibble of `quant_wbits` is preserved as given.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidBitWidth`] or
    /// [`CodecError::ReservedQuantWbits`] for unencodable quantization, and
    /// [`CodecError::PatchLengthMismatch`] if `patch` is not one patch.
    pub fn code_patch_header(
        &mut self,
        packer: &mut BitPacker,
        header: &mut PatchHeader,
        patch: &[i32],
        large_patch: bool,
    ) -> CodecResult<()> {
        self.expect_state(SessionState::GroupOpen, "code_patch_header")?;
        self.check_patch_len(patch.len())?;

        let wbits = word_bits_for(header.quant_wbits, patch)?;
        let quant_wbits = (header.quant_wbits & 0xF0) | (wbits - 2);
        if quant_wbits == wire::END_OF_PATCHES {
            return Err(CodecError::ReservedQuantWbits { quant_wbits });
        }
        header.quant_wbits = quant_wbits;

        wire::encode_patch_header(header, large_patch, packer)?;
        self.word_bits = wbits;
        self.state = SessionState::PatchOpen;
        Ok(())
    }

    /// Reads a patch header.
    ///
    /// The end-of-patches sentinel closes the group; callers check
    /// [`PatchHeader::is_end_of_patches`] on the result.
    ///
    /// # Errors
    ///
    /// Fails on exhausted input or if the group is not open.
    pub fn decode_patch_header(
        &mut self,
        packer: &mut BitPacker,
        large_patch: bool,
    ) -> CodecResult<PatchHeader> {
        self.expect_state(SessionState::GroupOpen, "decode_patch_header")?;
        let header = wire::decode_patch_header(packer, large_patch)?;
        if header.is_end_of_patches() {
            self.state = SessionState::Closed;
        } else {
            self.word_bits = header.word_bits();
            self.state = SessionState::PatchOpen;
        }
        Ok(header)
    }

    /// Writes the end-of-patches sentinel and closes the group.
    ///
    /// # Errors
    ///
    /// Fails on a full packer or if the group is not open.
    pub fn code_end_of_data(&mut self, packer: &mut BitPacker) -> CodecResult<()> {
        self.expect_state(SessionState::GroupOpen, "code_end_of_data")?;
        wire::encode_end_of_patches(packer)?;
        self.state = SessionState::Closed;
        Ok(())
    }

    /// Writes the body of the open patch.
    ///
    /// Coefficients from index `area - postquant` on are sent as zero.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidQuantizationIndex`] if `postquant`
    /// exceeds the patch area.
    pub fn code_patch(
        &mut self,
        packer: &mut BitPacker,
        patch: &[i32],
        postquant: usize,
    ) -> CodecResult<()> {
        self.expect_state(SessionState::PatchOpen, "code_patch")?;
        self.check_patch_len(patch.len())?;
        encode_coefficients(packer, patch, self.word_bits, postquant)?;
        self.state = SessionState::GroupOpen;
        Ok(())
    }

    /// Reads the body of the open patch into `out`.
    ///
    /// # Errors
    ///
    /// Fails on exhausted input, or if `out` is not exactly one patch.
    pub fn decode_patch(&mut self, packer: &mut BitPacker, out: &mut [i32]) -> CodecResult<()> {
        self.expect_state(SessionState::PatchOpen, "decode_patch")?;
        self.check_patch_len(out.len())?;
        decode_coefficients(packer, out, self.word_bits)?;
        self.state = SessionState::GroupOpen;
        Ok(())
    }

    fn open_group(&mut self, header: &GroupHeader) -> CodecResult<()> {
        check_patch_size(header.patch_size)?;
        self.group = Some(*header);
        self.word_bits = 0;
        self.state = SessionState::GroupOpen;
        Ok(())
    }

    fn expect_state(&self, expected: SessionState, operation: &'static str) -> CodecResult<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(CodecError::InvalidState {
                operation,
                state: self.state,
            })
        }
    }

    fn expect_group_boundary(&self, operation: &'static str) -> CodecResult<()> {
        if self.state == SessionState::PatchOpen {
            return Err(CodecError::InvalidState {
                operation,
                state: self.state,
            });
        }
        Ok(())
    }

    fn check_patch_len(&self, actual: usize) -> CodecResult<()> {
        let expected = self.patch_area();
        if actual != expected {
            return Err(CodecError::PatchLengthMismatch { expected, actual });
        }
        Ok(())
    }
}

fn check_patch_size(size: u8) -> CodecResult<()> {
    if size == 0 || size > LARGE_PATCH_SIZE {
        return Err(wire::WireError::InvalidPatchSize {
            size,
            max: LARGE_PATCH_SIZE,
        }
        .into());
    }
    Ok(())
}
