//! Group and patch header types, wire constants and field framing.

use bitstream::BitPacker;

use crate::error::{WireError, WireResult};

/// `quant_wbits` value marking the end of a group of patches.
pub const END_OF_PATCHES: u8 = 97;

/// Patch edge length used by standard regions.
pub const NORMAL_PATCH_SIZE: u8 = 16;

/// Largest patch edge length the codec accepts.
pub const LARGE_PATCH_SIZE: u8 = 32;

/// Plain zero coefficient tag (`0`).
pub const ZERO_CODE: u8 = 0x0;
/// Width of [`ZERO_CODE`] in bits.
pub const ZERO_CODE_BITS: usize = 1;

/// End-of-block tag (`10`): every remaining coefficient is zero.
pub const ZERO_EOB: u8 = 0x2;
/// Width of [`ZERO_EOB`] in bits.
pub const ZERO_EOB_BITS: usize = 2;

/// Positive coefficient tag (`110`).
pub const POSITIVE_VALUE: u8 = 0x6;
/// Negative coefficient tag (`111`).
pub const NEGATIVE_VALUE: u8 = 0x7;
/// Width of the signed value tags in bits.
pub const VALUE_CODE_BITS: usize = 3;

/// Group header size in bits: stride(16) + patch_size(8) + layer_type(8).
pub const GROUP_HEADER_BITS: usize = 16 + 8 + 8;

/// Width of `patch_ids` for standard regions.
pub const SMALL_PATCH_IDS_BITS: usize = 10;

/// Width of `patch_ids` for extended (large) regions.
pub const LARGE_PATCH_IDS_BITS: usize = 32;

/// Header shared by a group of patches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GroupHeader {
    /// Row stride of the destination grid.
    pub stride: u16,
    /// Edge length of every patch in the group.
    pub patch_size: u8,
    /// Layer type code of the group.
    pub layer_type: u8,
}

impl GroupHeader {
    /// Creates a new group header.
    #[must_use]
    pub const fn new(stride: u16, patch_size: u8, layer_type: u8) -> Self {
        Self {
            stride,
            patch_size,
            layer_type,
        }
    }

    /// Returns the number of coefficients in one patch.
    #[must_use]
    pub const fn patch_area(&self) -> usize {
        self.patch_size as usize * self.patch_size as usize
    }
}

/// Header preceding each patch of coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PatchHeader {
    /// Low nibble: `word_bits - 2`. High nibble: `prequant - 2`.
    pub quant_wbits: u8,
    /// Minimum sample of the patch.
    pub dc_offset: f32,
    /// Sample range of the patch.
    pub range: u16,
    /// Packed patch position within the region.
    pub patch_ids: u32,
}

impl PatchHeader {
    /// Returns the header that terminates a group.
    #[must_use]
    pub const fn end_of_patches() -> Self {
        Self {
            quant_wbits: END_OF_PATCHES,
            dc_offset: 0.0,
            range: 0,
            patch_ids: 0,
        }
    }

    /// Returns `true` if this header terminates the group.
    #[must_use]
    pub const fn is_end_of_patches(&self) -> bool {
        self.quant_wbits == END_OF_PATCHES
    }

    /// Returns the magnitude width encoded in the low nibble.
    #[must_use]
    pub const fn word_bits(&self) -> u8 {
        (self.quant_wbits & 0x0F) + 2
    }

    /// Returns the pre-quantization exponent encoded in the high nibble.
    #[must_use]
    pub const fn prequant(&self) -> u8 {
        (self.quant_wbits >> 4) + 2
    }

    /// Splits `patch_ids` into an `(x, y)` patch position.
    #[must_use]
    pub const fn patch_position(&self, large_patch: bool) -> (u32, u32) {
        if large_patch {
            (self.patch_ids >> 16, self.patch_ids & 0xFFFF)
        } else {
            (self.patch_ids >> 5, self.patch_ids & 0x1F)
        }
    }

    /// Packs an `(x, y)` patch position into a `patch_ids` value.
    #[must_use]
    pub const fn pack_position(x: u32, y: u32, large_patch: bool) -> u32 {
        if large_patch {
            (x << 16) | (y & 0xFFFF)
        } else {
            (x << 5) | (y & 0x1F)
        }
    }
}

const fn patch_ids_bits(large_patch: bool) -> usize {
    if large_patch {
        LARGE_PATCH_IDS_BITS
    } else {
        SMALL_PATCH_IDS_BITS
    }
}

/// Writes a group header.
pub fn encode_group_header(header: &GroupHeader, packer: &mut BitPacker) -> WireResult<()> {
    packer.pack_u32(u32::from(header.stride), 16)?;
    packer.pack_u32(u32::from(header.patch_size), 8)?;
    packer.pack_u32(u32::from(header.layer_type), 8)?;
    Ok(())
}

/// Reads a group header, rejecting patch sizes outside `1..=32`.
pub fn decode_group_header(packer: &mut BitPacker) -> WireResult<GroupHeader> {
    let stride = packer.unpack_u32(16)? as u16;
    let patch_size = packer.unpack_u32(8)? as u8;
    let layer_type = packer.unpack_u32(8)? as u8;
    if patch_size == 0 || patch_size > LARGE_PATCH_SIZE {
        return Err(WireError::InvalidPatchSize {
            size: patch_size,
            max: LARGE_PATCH_SIZE,
        });
    }
    Ok(GroupHeader {
        stride,
        patch_size,
        layer_type,
    })
}

/// Writes every field of a patch header as-is.
///
/// The word width is not derived here; callers that need the adaptive
/// `quant_wbits` go through the codec session.
pub fn encode_patch_header(
    header: &PatchHeader,
    large_patch: bool,
    packer: &mut BitPacker,
) -> WireResult<()> {
    packer.pack_u32(u32::from(header.quant_wbits), 8)?;
    packer.pack_f32(header.dc_offset)?;
    packer.pack_u32(u32::from(header.range), 16)?;
    packer.pack_u32(header.patch_ids, patch_ids_bits(large_patch))?;
    Ok(())
}

/// Writes the end-of-patches sentinel in place of a patch header.
pub fn encode_end_of_patches(packer: &mut BitPacker) -> WireResult<()> {
    packer.pack_u32(u32::from(END_OF_PATCHES), 8)?;
    Ok(())
}

/// Reads a patch header. The sentinel yields
/// [`PatchHeader::end_of_patches`] without reading further fields.
pub fn decode_patch_header(packer: &mut BitPacker, large_patch: bool) -> WireResult<PatchHeader> {
    let quant_wbits = packer.unpack_u32(8)? as u8;
    if quant_wbits == END_OF_PATCHES {
        return Ok(PatchHeader::end_of_patches());
    }
    let dc_offset = packer.unpack_f32()?;
    let range = packer.unpack_u32(16)? as u16;
    let patch_ids = packer.unpack_u32(patch_ids_bits(large_patch))?;
    Ok(PatchHeader {
        quant_wbits,
        dc_offset,
        range,
        patch_ids,
    })
}
