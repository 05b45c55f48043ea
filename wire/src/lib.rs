//! Header framing and layer type codes for the layer-data codec.
//!
//! This crate owns the fixed part of the wire format: group headers, patch
//! headers, the coefficient tag codes and the end-of-patches sentinel. It
//! does not know how coefficients are chosen or transformed.
//!
//! # Design Principles
//!
//! - **Stable wire format** - Field widths and tag codes never change.
//! - **Bounded decoding** - Header values that size later loops are validated.
//! - **No domain knowledge** - This crate frames headers, not terrain.

mod error;
mod header;
mod layer;
mod limits;

pub use error::{WireError, WireResult};
pub use header::{
    decode_group_header, decode_patch_header, encode_end_of_patches, encode_group_header,
    encode_patch_header, GroupHeader, PatchHeader, END_OF_PATCHES, GROUP_HEADER_BITS,
    LARGE_PATCH_IDS_BITS, LARGE_PATCH_SIZE, NEGATIVE_VALUE, NORMAL_PATCH_SIZE, POSITIVE_VALUE,
    SMALL_PATCH_IDS_BITS, VALUE_CODE_BITS, ZERO_CODE, ZERO_CODE_BITS, ZERO_EOB, ZERO_EOB_BITS,
};
pub use layer::{LayerCategory, LayerType};
pub use limits::Limits;
