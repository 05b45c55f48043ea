//! Low-level bit packing primitives for the layer-data codec.
//!
//! This crate provides [`BitPacker`], a fixed-capacity byte buffer with
//! bit-granular cursors used by both the encoder and the decoder side of the
//! terrain/atmosphere layer protocol.
//!
//! # Design Principles
//!
//! - **No unsafe code** - Safety is paramount.
//! - **Bounded operations** - The buffer never grows; overruns are errors.
//! - **No domain knowledge** - This crate knows nothing about patches or layers.
//! - **Host independent** - Multi-byte fields are framed low byte first on
//!   every platform.
//!
//! # Example
//!
//! ```
//! use bitstream::BitPacker;
//!
//! let mut packer = BitPacker::with_capacity(8);
//! packer.pack_u32(1, 1).unwrap();
//! packer.pack_u32(42, 7).unwrap();
//! packer.pack_u32(0x2AB, 10).unwrap();
//! packer.flush().unwrap();
//!
//! let mut reader = BitPacker::from_bytes(packer.into_bytes());
//! assert_eq!(reader.unpack_u32(1).unwrap(), 1);
//! assert_eq!(reader.unpack_u32(7).unwrap(), 42);
//! assert_eq!(reader.unpack_u32(10).unwrap(), 0x2AB);
//! ```

mod error;
mod packer;

pub use error::{BitError, BitResult};
pub use packer::BitPacker;

#[cfg(test)]
mod tests {
    use super::*;

    fn reader_for(packer: BitPacker) -> BitPacker {
        BitPacker::from_bytes(packer.into_bytes())
    }

    #[test]
    fn empty_roundtrip() {
        let packer = BitPacker::with_capacity(0);
        let reader = reader_for(packer);
        assert_eq!(reader.bits_remaining(), 0);
    }

    #[test]
    fn single_bit_roundtrip() {
        let mut packer = BitPacker::with_capacity(1);
        packer.pack_u32(1, 1).unwrap();
        packer.flush().unwrap();

        let mut reader = reader_for(packer);
        assert_eq!(reader.unpack_u32(1).unwrap(), 1);
    }

    #[test]
    fn bits_roundtrip_various_sizes() {
        let test_cases = [
            (0b1010u32, 4),
            (0xFFu32, 8),
            (0x1FFu32, 9),
            (0xABCDu32, 16),
            (0x1_2345u32, 17),
            (0x1234_5678u32, 32),
            (u32::MAX, 32),
        ];

        for (value, bits) in test_cases {
            let mut packer = BitPacker::with_capacity(4);
            packer.pack_u32(value, bits).unwrap();
            packer.flush().unwrap();

            let mut reader = reader_for(packer);
            let read_value = reader.unpack_u32(bits).unwrap();
            assert_eq!(
                read_value, value,
                "roundtrip failed for {bits}-bit value {value}"
            );
        }
    }

    #[test]
    fn mixed_roundtrip() {
        let mut packer = BitPacker::with_capacity(16);
        packer.pack_u32(1, 1).unwrap();
        packer.pack_u32(0b1010, 4).unwrap();
        packer.pack_u32(0, 1).unwrap();
        packer.pack_f32(3.5).unwrap();
        packer.pack_u32(0xFF, 8).unwrap();
        packer.pack_u32(42, 7).unwrap();
        packer.flush().unwrap();

        let mut reader = reader_for(packer);
        assert_eq!(reader.unpack_u32(1).unwrap(), 1);
        assert_eq!(reader.unpack_u32(4).unwrap(), 0b1010);
        assert_eq!(reader.unpack_u32(1).unwrap(), 0);
        assert_eq!(reader.unpack_f32().unwrap().to_bits(), 3.5f32.to_bits());
        assert_eq!(reader.unpack_u32(8).unwrap(), 0xFF);
        assert_eq!(reader.unpack_u32(7).unwrap(), 42);
    }

    #[test]
    fn doctest_example() {
        let mut packer = BitPacker::with_capacity(8);
        packer.pack_u32(1, 1).unwrap();
        packer.pack_u32(42, 7).unwrap();
        packer.flush().unwrap();

        let mut reader = reader_for(packer);
        assert_eq!(reader.unpack_u32(1).unwrap(), 1);
        assert_eq!(reader.unpack_u32(7).unwrap(), 42);
    }
}
