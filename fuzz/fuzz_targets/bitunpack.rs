#![no_main]

use bitstream::BitPacker;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&ops, payload)) = data.split_first() else {
        return;
    };
    let mut packer = BitPacker::from_bytes(payload.to_vec());
    let mut scratch = [0u8; 8];

    // The first byte seeds a bounded sequence of reads of varying widths.
    let mut op = ops;
    for _ in 0..256 {
        op = op.wrapping_mul(31).wrapping_add(7);
        let result = match op % 4 {
            0 => packer.unpack_into(&mut scratch[..1], usize::from(op % 9)).map(|_| ()),
            1 => packer.unpack_u32(usize::from(op % 33)).map(|_| ()),
            2 => packer.unpack_f32().map(|_| ()),
            _ => packer.unpack(usize::from(op % 65)).map(|_| ()),
        };
        if result.is_err() {
            break;
        }
    }
});
