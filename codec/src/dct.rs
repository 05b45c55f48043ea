//! DCT quantization of height-like sample grids.
//!
//! [`DctTables::compress_patch`] turns a `size × size` window of samples into
//! integer coefficients in zig-zag order, ready for
//! [`CodecSession::code_patch`](crate::CodecSession::code_patch);
//! [`DctTables::decompress_patch`] reverses it on the receiving side.

use std::f32::consts::{FRAC_1_SQRT_2, PI};

use wire::{PatchHeader, LARGE_PATCH_SIZE};

use crate::error::{CodecError, CodecResult};
use crate::patch::MAX_WORD_BITS;

/// Smallest accepted pre-quantization exponent.
pub const MIN_PREQUANT: u8 = 2;

/// Largest accepted pre-quantization exponent.
pub const MAX_PREQUANT: u8 = MAX_WORD_BITS as u8;

/// Precomputed tables for one patch size.
#[derive(Debug, Clone)]
pub struct DctTables {
    size: usize,
    quantize: Vec<f32>,
    dequantize: Vec<f32>,
    cosines: Vec<f32>,
    zigzag: Vec<usize>,
}

impl DctTables {
    /// Builds the tables for `size × size` patches.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Wire`] if `size` is outside `1..=32`.
    pub fn new(size: u8) -> CodecResult<Self> {
        if size == 0 || size > LARGE_PATCH_SIZE {
            return Err(wire::WireError::InvalidPatchSize {
                size,
                max: LARGE_PATCH_SIZE,
            }
            .into());
        }
        let n = usize::from(size);

        let mut quantize = Vec::with_capacity(n * n);
        let mut dequantize = Vec::with_capacity(n * n);
        for j in 0..n {
            for i in 0..n {
                let weight = 1.0 + 2.0 * (i + j) as f32;
                quantize.push(1.0 / weight);
                dequantize.push(weight);
            }
        }

        let mut cosines = Vec::with_capacity(n * n);
        let oo_two_size = 1.0 / (2.0 * n as f32);
        for u in 0..n {
            for k in 0..n {
                cosines.push(((2.0 * k as f32 + 1.0) * u as f32 * PI * oo_two_size).cos());
            }
        }

        Ok(Self {
            size: n,
            quantize,
            dequantize,
            cosines,
            zigzag: build_zigzag(n),
        })
    }

    /// Returns the patch edge length.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Returns the number of coefficients per patch.
    #[must_use]
    pub const fn area(&self) -> usize {
        self.size * self.size
    }

    /// Maps raster position to transmission position.
    #[must_use]
    pub fn zigzag(&self) -> &[usize] {
        &self.zigzag
    }

    /// Quantizes one patch of `heights` read with row `stride`.
    ///
    /// `header.dc_offset` and `header.range` must already describe the
    /// patch (see [`prescan_patch`]). Sets both nibbles of
    /// `header.quant_wbits` to `prequant - 2`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidPrequant`] for `prequant` outside
    /// `[2, 17]` and [`CodecError::GridTooSmall`] if `heights` does not
    /// cover the patch.
    pub fn compress_patch(
        &self,
        heights: &[f32],
        stride: usize,
        header: &mut PatchHeader,
        prequant: u8,
    ) -> CodecResult<Vec<i32>> {
        if !(MIN_PREQUANT..=MAX_PREQUANT).contains(&prequant) {
            return Err(CodecError::InvalidPrequant { prequant });
        }
        let n = self.size;
        check_grid(heights.len(), stride, n)?;

        let nibble = prequant - MIN_PREQUANT;
        header.quant_wbits = nibble | (nibble << 4);

        let range = f32::from(header.range.max(1));
        let quantize = (1u32 << prequant) as f32;
        let premult = (1.0 / range) * quantize;
        let sub = (1u32 << (prequant - 1)) as f32 + header.dc_offset * premult;

        let mut block = vec![0.0f32; n * n];
        for j in 0..n {
            for i in 0..n {
                block[j * n + i] = heights[j * stride + i] * premult - sub;
            }
        }

        let mut out = vec![0i32; n * n];
        self.forward(&block, &mut out);
        Ok(out)
    }

    /// Reconstructs one patch into `out` with row `stride`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::PatchLengthMismatch`] if `coefficients` is not
    /// one patch and [`CodecError::GridTooSmall`] if `out` does not cover it.
    pub fn decompress_patch(
        &self,
        coefficients: &[i32],
        header: &PatchHeader,
        stride: usize,
        out: &mut [f32],
    ) -> CodecResult<()> {
        let n = self.size;
        if coefficients.len() != n * n {
            return Err(CodecError::PatchLengthMismatch {
                expected: n * n,
                actual: coefficients.len(),
            });
        }
        check_grid(out.len(), stride, n)?;

        let prequant = header.prequant();
        let ooq = 1.0 / (1u32 << prequant) as f32;
        let mult = ooq * f32::from(header.range);
        let addval = mult * (1u32 << (prequant - 1)) as f32 + header.dc_offset;

        let mut block: Vec<f32> = self
            .zigzag
            .iter()
            .zip(&self.dequantize)
            .map(|(&pos, &dq)| coefficients[pos] as f32 * dq)
            .collect();
        self.inverse(&mut block);

        for j in 0..n {
            for i in 0..n {
                out[j * stride + i] = block[j * n + i] * mult + addval;
            }
        }
        Ok(())
    }

    fn cosine_row(&self, u: usize) -> &[f32] {
        &self.cosines[u * self.size..(u + 1) * self.size]
    }

    fn forward(&self, block: &[f32], out: &mut [i32]) {
        let n = self.size;
        let mut temp = vec![0.0f32; n * n];

        for line in 0..n {
            let row = &block[line * n..(line + 1) * n];
            temp[line * n] = FRAC_1_SQRT_2 * row.iter().sum::<f32>();
            for u in 1..n {
                temp[line * n + u] = row
                    .iter()
                    .zip(self.cosine_row(u))
                    .map(|(a, b)| a * b)
                    .sum();
            }
        }

        let oosob = 2.0 / n as f32;
        for column in 0..n {
            let total: f32 = (0..n).map(|k| temp[k * n + column]).sum();
            out[self.zigzag[column]] =
                (FRAC_1_SQRT_2 * total * oosob * self.quantize[column]) as i32;
            for u in 1..n {
                let cosines = self.cosine_row(u);
                let total: f32 = (0..n).map(|k| temp[k * n + column] * cosines[k]).sum();
                let index = n * u + column;
                out[self.zigzag[index]] = (total * oosob * self.quantize[index]) as i32;
            }
        }
    }

    fn inverse(&self, block: &mut [f32]) {
        let n = self.size;
        let mut temp = vec![0.0f32; n * n];

        for column in 0..n {
            for k in 0..n {
                let mut total = FRAC_1_SQRT_2 * block[column];
                for u in 1..n {
                    total += block[u * n + column] * self.cosines[u * n + k];
                }
                temp[k * n + column] = total;
            }
        }

        let oosob = 2.0 / n as f32;
        for line in 0..n {
            for k in 0..n {
                let mut total = FRAC_1_SQRT_2 * temp[line * n];
                for u in 1..n {
                    total += temp[line * n + u] * self.cosines[u * n + k];
                }
                block[line * n + k] = total * oosob;
            }
        }
    }
}

/// Returns `(dc_offset, range)` for one patch of `heights`.
///
/// `dc_offset` is the minimum sample and `range` is `max - min + 1`,
/// saturated to `u16`.
#[must_use]
pub fn prescan_patch(heights: &[f32], stride: usize, size: usize) -> (f32, u16) {
    let mut min = f32::MAX;
    let mut max = f32::MIN;
    for j in 0..size {
        for &h in heights.iter().skip(j * stride).take(size) {
            min = min.min(h);
            max = max.max(h);
        }
    }
    if min > max {
        return (0.0, 1);
    }
    (min, (max - min + 1.0) as u16)
}

fn check_grid(available: usize, stride: usize, size: usize) -> CodecResult<()> {
    let needed = if stride < size {
        // Rows would overlap.
        usize::MAX
    } else {
        (size - 1) * stride + size
    };
    if available < needed {
        return Err(CodecError::GridTooSmall { needed, available });
    }
    Ok(())
}

/// Zig-zag walk from the DC corner, alternating up-right and down-left
/// diagonals.
fn build_zigzag(size: usize) -> Vec<usize> {
    let mut matrix = vec![0usize; size * size];
    let (mut i, mut j) = (0usize, 0usize);
    let mut diagonal = false;
    let mut right = true;
    let mut count = 0;

    while i < size && j < size {
        matrix[j * size + i] = count;
        count += 1;

        if !diagonal {
            if right {
                if i < size - 1 {
                    i += 1;
                } else {
                    j += 1;
                }
            } else if j < size - 1 {
                j += 1;
            } else {
                i += 1;
            }
            right = !right;
            diagonal = true;
        } else if right {
            i += 1;
            j -= 1;
            if i == size - 1 || j == 0 {
                diagonal = false;
            }
        } else {
            i -= 1;
            j += 1;
            if i == 0 || j == size - 1 {
                diagonal = false;
            }
        }
    }
    matrix
}
