//! Coefficient coding and adaptive word width selection.
//!
//! A patch body is a sequence of tagged coefficients:
//!
//! ```text
//! 0                zero
//! 10               every remaining coefficient is zero
//! 110 <magnitude>  positive value
//! 111 <magnitude>  negative value
//! ```
//!
//! Magnitudes are `word_bits` wide and written with [`BitPacker::pack_u32`].

use bitstream::BitPacker;
use wire::{
    NEGATIVE_VALUE, POSITIVE_VALUE, VALUE_CODE_BITS, ZERO_CODE, ZERO_CODE_BITS, ZERO_EOB,
    ZERO_EOB_BITS,
};

use crate::error::{CodecError, CodecResult};

/// Smallest magnitude width a patch header can carry.
pub const MIN_WORD_BITS: u32 = 2;

/// Largest magnitude width a patch header can carry.
pub const MAX_WORD_BITS: u32 = 17;

/// Chooses the magnitude width for `patch` given the caller's `quant_wbits`.
///
/// The low nibble of `quant_wbits` sets a search window of
/// `[base / 2, base + 5]` where `base = nibble + 2`; the result is one more
/// than the highest set bit found in that window across all non-zero
/// coefficients, or `base / 2 + 1` for an all-zero patch.
///
/// # Errors
///
/// Returns [`CodecError::InvalidBitWidth`] if the width falls outside
/// `[2, 17]`.
pub fn word_bits_for(quant_wbits: u8, patch: &[i32]) -> CodecResult<u8> {
    let base = u32::from(quant_wbits & 0x0F) + 2;
    let max_wbits = base + 5;
    let min_wbits = base >> 1;

    let mut wbits = min_wbits;
    for magnitude in patch.iter().map(|v| v.unsigned_abs()).filter(|m| *m != 0) {
        if let Some(bit) = (min_wbits + 1..=max_wbits)
            .rev()
            .find(|bit| magnitude & (1 << bit) != 0)
        {
            wbits = wbits.max(bit);
        }
    }
    wbits += 1;

    if !(MIN_WORD_BITS..=MAX_WORD_BITS).contains(&wbits) {
        return Err(CodecError::InvalidBitWidth { wbits });
    }
    // In range, fits a u8.
    Ok(wbits as u8)
}

/// Writes the coefficient codes for one patch.
///
/// Coefficients at index `area - postquant` and beyond are coded as zero
/// without touching `patch`. Magnitudes that do not fit `word_bits` are
/// clamped to the largest representable value.
pub(crate) fn encode_coefficients(
    packer: &mut BitPacker,
    patch: &[i32],
    word_bits: u8,
    postquant: usize,
) -> CodecResult<()> {
    let area = patch.len();
    if postquant > area {
        return Err(CodecError::InvalidQuantizationIndex { postquant, area });
    }
    let cutoff = area - postquant;
    let last_nonzero = patch[..cutoff].iter().rposition(|&v| v != 0);
    let max_magnitude = (1u32 << word_bits) - 1;

    for (index, &value) in patch[..cutoff].iter().enumerate() {
        if value == 0 {
            if last_nonzero.map_or(true, |last| index > last) {
                packer.pack_u32(u32::from(ZERO_EOB), ZERO_EOB_BITS)?;
                return Ok(());
            }
            packer.pack_u32(u32::from(ZERO_CODE), ZERO_CODE_BITS)?;
        } else {
            let code = if value < 0 {
                NEGATIVE_VALUE
            } else {
                POSITIVE_VALUE
            };
            packer.pack_u32(u32::from(code), VALUE_CODE_BITS)?;
            packer.pack_u32(
                value.unsigned_abs().min(max_magnitude),
                usize::from(word_bits),
            )?;
        }
    }

    // Quantized-away tail.
    if cutoff < area {
        packer.pack_u32(u32::from(ZERO_EOB), ZERO_EOB_BITS)?;
    }
    Ok(())
}

/// Reads coefficient codes until `out` is full or an end-of-block code.
pub(crate) fn decode_coefficients(
    packer: &mut BitPacker,
    out: &mut [i32],
    word_bits: u8,
) -> CodecResult<()> {
    let mut index = 0;
    while index < out.len() {
        if packer.unpack_u32(1)? == 0 {
            out[index] = 0;
            index += 1;
            continue;
        }
        if packer.unpack_u32(1)? == 0 {
            out[index..].fill(0);
            return Ok(());
        }
        let negative = packer.unpack_u32(1)? == 1;
        // At most 17 bits wide.
        let magnitude = packer.unpack_u32(usize::from(word_bits))? as i32;
        out[index] = if negative { -magnitude } else { magnitude };
        index += 1;
    }
    Ok(())
}
