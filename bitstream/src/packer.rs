//! Fixed-capacity bit packer with MSB-first framing.

use crate::error::{BitError, BitResult};

/// Number of bits in one load register / buffer byte.
const MAX_DATA_BITS: usize = 8;

/// Widest logical field accepted by the `*_u32` helpers.
const MAX_FIELD_BITS: usize = 32;

/// A bit-granular view over a fixed-capacity byte buffer.
///
/// One `BitPacker` serves one session in one direction: an encoder built with
/// [`with_capacity`](Self::with_capacity) packs bits into the buffer, a
/// decoder built with [`from_bytes`](Self::from_bytes) unpacks them again.
/// Bits are staged in an 8-bit load register and move MSB-first within each
/// byte.
///
/// Multi-byte fields are framed as a sequence of 8-bit chunks, low-order byte
/// first, with the last chunk carrying the remaining low-order bits. The
/// [`pack_u32`](Self::pack_u32) family does this split so the wire layout
/// does not depend on host byte order.
#[derive(Debug, Clone)]
pub struct BitPacker {
    /// Backing storage; its length is the capacity.
    buffer: Vec<u8>,
    /// Complete bytes produced (packing) or consumed (unpacking).
    byte_count: usize,
    /// Sub-byte staging register.
    load: u8,
    /// Bits currently staged in `load` (0-8).
    bits_in_load: u8,
    /// Diagnostic counter of every bit moved through the packer.
    total_bits: u64,
}

impl BitPacker {
    /// Creates an encoding session over a zeroed buffer of `capacity` bytes.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self::from_bytes(vec![0; capacity])
    }

    /// Creates a decoding session over received bytes.
    ///
    /// The capacity is the length of `bytes`.
    #[must_use]
    pub const fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            buffer: bytes,
            byte_count: 0,
            load: 0,
            bits_in_load: 0,
            total_bits: 0,
        }
    }

    /// Returns the fixed buffer capacity in bytes.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Returns the number of complete bytes packed or consumed so far.
    #[must_use]
    pub const fn byte_count(&self) -> usize {
        self.byte_count
    }

    /// Returns the number of bits staged in the load register.
    #[must_use]
    pub const fn bits_in_accumulator(&self) -> u8 {
        self.bits_in_load
    }

    /// Returns the total number of bits moved through this packer.
    #[must_use]
    pub const fn total_bits(&self) -> u64 {
        self.total_bits
    }

    /// Returns the number of bits still available to unpack.
    #[must_use]
    pub fn bits_remaining(&self) -> usize {
        (self.capacity() - self.byte_count) * MAX_DATA_BITS + usize::from(self.bits_in_load)
    }

    /// Returns the bytes written so far (excluding staged bits).
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer[..self.byte_count]
    }

    /// Consumes the packer and returns the written bytes.
    ///
    /// Call [`flush`](Self::flush) first to include staged bits.
    #[must_use]
    pub fn into_bytes(mut self) -> Vec<u8> {
        self.buffer.truncate(self.byte_count);
        self.buffer
    }

    /// Packs `num_bits` bits taken from `source`.
    ///
    /// Each of the first `ceil(num_bits / 8)` source bytes contributes one
    /// chunk: all 8 bits for every chunk but the last, which contributes its
    /// `num_bits mod 8` low-order bits (or 8 when the count is a multiple of
    /// 8). Chunk bits are emitted most significant first.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::InvalidBitCount`] if `source` is too short and
    /// [`BitError::BufferExhausted`] if the bytes would not fit. Nothing is
    /// written on error.
    pub fn pack(&mut self, source: &[u8], num_bits: usize) -> BitResult<()> {
        let chunks = num_bits.div_ceil(MAX_DATA_BITS);
        if chunks > source.len() {
            return Err(BitError::InvalidBitCount {
                bits: num_bits,
                max_bits: source.len() * MAX_DATA_BITS,
            });
        }
        let flushes = (usize::from(self.bits_in_load) + num_bits) / MAX_DATA_BITS;
        if self.byte_count + flushes > self.capacity() {
            return Err(BitError::BufferExhausted {
                attempted: num_bits,
                capacity: self.capacity(),
            });
        }

        let mut remaining = num_bits;
        for &byte in &source[..chunks] {
            let dsize = remaining.min(MAX_DATA_BITS);
            remaining -= dsize;
            let mut data = byte << (MAX_DATA_BITS - dsize);
            for _ in 0..dsize {
                self.load = (self.load << 1) | (data >> 7);
                self.bits_in_load += 1;
                self.total_bits += 1;
                if usize::from(self.bits_in_load) == MAX_DATA_BITS {
                    self.buffer[self.byte_count] = self.load;
                    self.byte_count += 1;
                    self.load = 0;
                    self.bits_in_load = 0;
                }
                data <<= 1;
            }
        }
        Ok(())
    }

    /// Unpacks `num_bits` bits into `out`, one byte per chunk of up to 8
    /// bits. A partial last chunk is right-aligned.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::InvalidBitCount`] if `out` is too short and
    /// [`BitError::UnexpectedEof`] if the input has fewer bits left. Nothing
    /// is consumed on error.
    pub fn unpack_into(&mut self, out: &mut [u8], num_bits: usize) -> BitResult<()> {
        let chunks = num_bits.div_ceil(MAX_DATA_BITS);
        if chunks > out.len() {
            return Err(BitError::InvalidBitCount {
                bits: num_bits,
                max_bits: out.len() * MAX_DATA_BITS,
            });
        }
        let available = self.bits_remaining();
        if num_bits > available {
            return Err(BitError::UnexpectedEof {
                requested: num_bits,
                available,
            });
        }

        let mut remaining = num_bits;
        for slot in &mut out[..chunks] {
            let dsize = remaining.min(MAX_DATA_BITS);
            remaining -= dsize;
            let mut value = 0u8;
            for _ in 0..dsize {
                if self.bits_in_load == 0 {
                    self.load = self.buffer[self.byte_count];
                    self.byte_count += 1;
                    self.bits_in_load = 8;
                }
                value = (value << 1) | (self.load >> 7);
                self.load <<= 1;
                self.bits_in_load -= 1;
                self.total_bits += 1;
            }
            *slot = value;
        }
        Ok(())
    }

    /// Unpacks `num_bits` bits into a freshly allocated byte vector.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::UnexpectedEof`] if the input runs out.
    pub fn unpack(&mut self, num_bits: usize) -> BitResult<Vec<u8>> {
        let mut out = vec![0u8; num_bits.div_ceil(MAX_DATA_BITS)];
        self.unpack_into(&mut out, num_bits)?;
        Ok(out)
    }

    /// Packs the low `bits` bits of `value` as little-endian chunks.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::InvalidBitCount`] if `bits > 32` and
    /// [`BitError::BufferExhausted`] if the bits would not fit.
    pub fn pack_u32(&mut self, value: u32, bits: usize) -> BitResult<()> {
        if bits > MAX_FIELD_BITS {
            return Err(BitError::InvalidBitCount {
                bits,
                max_bits: MAX_FIELD_BITS,
            });
        }
        self.pack(&value.to_le_bytes(), bits)
    }

    /// Unpacks a `bits`-wide field written by [`pack_u32`](Self::pack_u32).
    ///
    /// # Errors
    ///
    /// Returns [`BitError::InvalidBitCount`] if `bits > 32` and
    /// [`BitError::UnexpectedEof`] if the input runs out.
    pub fn unpack_u32(&mut self, bits: usize) -> BitResult<u32> {
        if bits > MAX_FIELD_BITS {
            return Err(BitError::InvalidBitCount {
                bits,
                max_bits: MAX_FIELD_BITS,
            });
        }
        let mut bytes = [0u8; 4];
        self.unpack_into(&mut bytes, bits)?;
        Ok(u32::from_le_bytes(bytes))
    }

    /// Packs the IEEE-754 bit pattern of `value` (32 bits).
    pub fn pack_f32(&mut self, value: f32) -> BitResult<()> {
        self.pack_u32(value.to_bits(), MAX_FIELD_BITS)
    }

    /// Unpacks a value written by [`pack_f32`](Self::pack_f32).
    pub fn unpack_f32(&mut self) -> BitResult<f32> {
        self.unpack_u32(MAX_FIELD_BITS).map(f32::from_bits)
    }

    /// Writes any staged bits as a final byte, padded with zeros on the
    /// right. Returns the byte count.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::BufferExhausted`] if the buffer is already full.
    pub fn flush(&mut self) -> BitResult<usize> {
        if self.bits_in_load > 0 {
            if self.byte_count >= self.capacity() {
                return Err(BitError::BufferExhausted {
                    attempted: usize::from(self.bits_in_load),
                    capacity: self.capacity(),
                });
            }
            self.buffer[self.byte_count] = self.load << (8 - self.bits_in_load);
            self.byte_count += 1;
            self.load = 0;
            self.bits_in_load = 0;
        }
        Ok(self.byte_count)
    }

    /// Rewinds all cursors and counters so the buffer can be reused.
    pub fn reset(&mut self) {
        self.byte_count = 0;
        self.load = 0;
        self.bits_in_load = 0;
        self.total_bits = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_packer() {
        let mut packer = BitPacker::with_capacity(4);
        assert_eq!(packer.byte_count(), 0);
        assert_eq!(packer.flush().unwrap(), 0);
        assert!(packer.into_bytes().is_empty());
    }

    #[test]
    fn pack_partial_byte_with_padding() {
        let mut packer = BitPacker::with_capacity(1);
        packer.pack(&[0b101], 3).unwrap();
        assert_eq!(packer.bits_in_accumulator(), 3);
        assert_eq!(packer.byte_count(), 0);
        packer.flush().unwrap();
        assert_eq!(packer.into_bytes(), vec![0b1010_0000]);
    }

    #[test]
    fn pack_uses_low_bits_of_last_chunk() {
        let mut packer = BitPacker::with_capacity(1);
        // Only the low two bits (0b10) of the source byte are transmitted.
        packer.pack(&[0b1111_1110], 2).unwrap();
        packer.flush().unwrap();
        assert_eq!(packer.into_bytes(), vec![0b1000_0000]);
    }

    #[test]
    fn pack_full_bytes_flush_immediately() {
        let mut packer = BitPacker::with_capacity(2);
        packer.pack(&[0xAB, 0xCD], 16).unwrap();
        assert_eq!(packer.byte_count(), 2);
        assert_eq!(packer.bits_in_accumulator(), 0);
        assert_eq!(packer.as_bytes(), &[0xAB, 0xCD]);
    }

    #[test]
    fn pack_u32_sends_low_byte_first() {
        let mut packer = BitPacker::with_capacity(2);
        packer.pack_u32(0x2AB, 10).unwrap();
        packer.flush().unwrap();
        // 0xAB in 8 bits, then the low two bits of 0x02.
        assert_eq!(packer.into_bytes(), vec![0xAB, 0b1000_0000]);
    }

    #[test]
    fn pack_u32_masks_high_bits() {
        let mut packer = BitPacker::with_capacity(2);
        packer.pack_u32(0xFFFF_FC00 | 0x155, 10).unwrap();
        packer.flush().unwrap();

        let mut reader = BitPacker::from_bytes(packer.into_bytes());
        assert_eq!(reader.unpack_u32(10).unwrap(), 0x155);
    }

    #[test]
    fn pack_across_byte_boundary() {
        let mut packer = BitPacker::with_capacity(2);
        packer.pack(&[0b1111], 4).unwrap();
        packer.pack(&[0b1010_1010], 8).unwrap();
        packer.flush().unwrap();
        assert_eq!(packer.into_bytes(), vec![0b1111_1010, 0b1010_0000]);
    }

    #[test]
    fn pack_rejects_short_source() {
        let mut packer = BitPacker::with_capacity(4);
        let err = packer.pack(&[0xFF], 9).unwrap_err();
        assert_eq!(
            err,
            BitError::InvalidBitCount {
                bits: 9,
                max_bits: 8
            }
        );
    }

    #[test]
    fn pack_past_capacity_is_rejected_without_writing() {
        let mut packer = BitPacker::with_capacity(1);
        let err = packer.pack(&[0xFF, 0xFF], 16).unwrap_err();
        assert!(matches!(err, BitError::BufferExhausted { capacity: 1, .. }));
        assert_eq!(packer.byte_count(), 0);
        assert_eq!(packer.bits_in_accumulator(), 0);
        assert_eq!(packer.total_bits(), 0);
    }

    #[test]
    fn flush_past_capacity_is_rejected() {
        let mut packer = BitPacker::with_capacity(1);
        packer.pack_u32(0x1FF, 9).unwrap();
        assert_eq!(packer.byte_count(), 1);
        let err = packer.flush().unwrap_err();
        assert!(matches!(err, BitError::BufferExhausted { .. }));
        assert!(packer.byte_count() <= packer.capacity());
    }

    #[test]
    fn unpack_partial_chunk_is_right_aligned() {
        let mut packer = BitPacker::from_bytes(vec![0b1010_0000]);
        assert_eq!(packer.unpack(3).unwrap(), vec![0b101]);
        assert_eq!(packer.bits_remaining(), 5);
    }

    #[test]
    fn unpack_past_end_fails_without_consuming() {
        let mut packer = BitPacker::from_bytes(vec![0xFF]);
        packer.unpack(4).unwrap();
        let err = packer.unpack(5).unwrap_err();
        assert_eq!(
            err,
            BitError::UnexpectedEof {
                requested: 5,
                available: 4
            }
        );
        assert_eq!(packer.unpack(4).unwrap(), vec![0x0F]);
    }

    #[test]
    fn unpack_from_empty_fails() {
        let mut packer = BitPacker::from_bytes(Vec::new());
        assert!(matches!(
            packer.unpack_u32(1),
            Err(BitError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn u32_field_width_is_bounded() {
        let mut packer = BitPacker::with_capacity(8);
        assert!(matches!(
            packer.pack_u32(0, 33),
            Err(BitError::InvalidBitCount {
                bits: 33,
                max_bits: 32
            })
        ));
        assert!(matches!(
            packer.unpack_u32(33),
            Err(BitError::InvalidBitCount { .. })
        ));
    }

    #[test]
    fn f32_roundtrip_preserves_bit_pattern() {
        let mut packer = BitPacker::with_capacity(8);
        packer.pack_f32(-12.375).unwrap();
        packer.pack_f32(f32::NAN).unwrap();
        packer.flush().unwrap();

        let mut reader = BitPacker::from_bytes(packer.into_bytes());
        assert_eq!(reader.unpack_f32().unwrap(), -12.375);
        assert_eq!(reader.unpack_f32().unwrap().to_bits(), f32::NAN.to_bits());
    }

    #[test]
    fn total_bits_counts_both_directions() {
        let mut packer = BitPacker::with_capacity(4);
        packer.pack_u32(5, 3).unwrap();
        packer.pack_u32(1, 1).unwrap();
        assert_eq!(packer.total_bits(), 4);
        packer.flush().unwrap();
        // Padding is not counted.
        assert_eq!(packer.total_bits(), 4);

        let mut reader = BitPacker::from_bytes(packer.into_bytes());
        reader.unpack_u32(4).unwrap();
        assert_eq!(reader.total_bits(), 4);
    }

    #[test]
    fn reset_rewinds_cursors() {
        let mut packer = BitPacker::with_capacity(2);
        packer.pack_u32(0xABC, 12).unwrap();
        packer.reset();
        assert_eq!(packer.byte_count(), 0);
        assert_eq!(packer.bits_in_accumulator(), 0);
        assert_eq!(packer.total_bits(), 0);

        packer.pack_u32(0x12, 8).unwrap();
        assert_eq!(packer.as_bytes(), &[0x12]);
    }
}
