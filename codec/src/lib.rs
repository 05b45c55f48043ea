//! Patch coding for the layer-data codec.
//!
//! Ties together `bitstream` and `wire` to code quantized patches of layer
//! data: adaptive word widths, tagged coefficients with an end-of-block
//! shortcut, and the DCT quantizer that produces and consumes them.
//!
//! # Features
//!
//! - Explicit per-job [`CodecSession`] instead of shared codec state
//! - Adaptive magnitude width per patch
//! - Zig-zag ordered DCT quantization for any patch size up to 32
//!
//! # Design Principles
//!
//! - **Correctness first** - Encoder misuse surfaces as [`CodecError`].
//! - **Untrusted input** - Decoding never panics on malformed bytes.
//! - **Deterministic** - Same inputs produce same outputs.

mod dct;
mod error;
mod patch;
mod session;

pub use dct::{prescan_patch, DctTables, MAX_PREQUANT, MIN_PREQUANT};
pub use error::{CodecError, CodecResult};
pub use patch::{word_bits_for, MAX_WORD_BITS, MIN_WORD_BITS};
pub use session::{CodecSession, SessionState};
pub use wire::Limits as WireLimits;
