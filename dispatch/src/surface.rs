//! Terrain height surface fed by land groups.

use bitstream::BitPacker;
use codec::{CodecSession, DctTables};
use log::trace;
use wire::Limits;

use crate::error::{DispatchError, DispatchResult};

/// Height grid of one region, split into square patches.
///
/// The grid has one extra row and column so neighbouring regions can share
/// their edge samples.
#[derive(Debug, Clone)]
pub struct Surface {
    patches_per_edge: u32,
    patch_size: u8,
    grids_per_edge: usize,
    heights: Vec<f32>,
    received: Vec<bool>,
    tables: DctTables,
    limits: Limits,
}

impl Surface {
    /// Creates a flat surface of `patches_per_edge²` patches.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Codec`] if `patch_size` is outside `1..=32`.
    pub fn new(patches_per_edge: u32, patch_size: u8) -> DispatchResult<Self> {
        Self::with_limits(patches_per_edge, patch_size, Limits::default())
    }

    /// Creates a surface with explicit decode limits.
    pub fn with_limits(
        patches_per_edge: u32,
        patch_size: u8,
        limits: Limits,
    ) -> DispatchResult<Self> {
        let tables = DctTables::new(patch_size)?;
        let grids_per_edge = patches_per_edge as usize * usize::from(patch_size) + 1;
        let patch_count = patches_per_edge as usize * patches_per_edge as usize;
        Ok(Self {
            patches_per_edge,
            patch_size,
            grids_per_edge,
            heights: vec![0.0; grids_per_edge * grids_per_edge],
            received: vec![false; patch_count],
            tables,
            limits,
        })
    }

    #[must_use]
    pub const fn patches_per_edge(&self) -> u32 {
        self.patches_per_edge
    }

    #[must_use]
    pub const fn patch_size(&self) -> u8 {
        self.patch_size
    }

    /// Samples per grid row.
    #[must_use]
    pub const fn grids_per_edge(&self) -> usize {
        self.grids_per_edge
    }

    /// All samples, row-major with [`Self::grids_per_edge`] stride.
    #[must_use]
    pub fn heights(&self) -> &[f32] {
        &self.heights
    }

    /// Sample at grid position `(x, y)`.
    #[must_use]
    pub fn height_at(&self, x: usize, y: usize) -> Option<f32> {
        if x >= self.grids_per_edge || y >= self.grids_per_edge {
            return None;
        }
        Some(self.heights[y * self.grids_per_edge + x])
    }

    /// Returns `true` once patch `(x, y)` has been decoded.
    #[must_use]
    pub fn patch_received(&self, x: u32, y: u32) -> bool {
        if x >= self.patches_per_edge || y >= self.patches_per_edge {
            return false;
        }
        self.received[(y * self.patches_per_edge + x) as usize]
    }

    /// Number of distinct patches decoded so far.
    #[must_use]
    pub fn received_count(&self) -> usize {
        self.received.iter().filter(|r| **r).count()
    }

    /// Decodes patches until the end-of-patches sentinel.
    ///
    /// Patches decoded before an error stay applied; the rest of the packet
    /// is abandoned.
    pub fn decompress(
        &mut self,
        packer: &mut BitPacker,
        session: &mut CodecSession,
        large_patch: bool,
    ) -> DispatchResult<()> {
        if session.patch_size() != self.patch_size {
            return Err(DispatchError::PatchSizeMismatch {
                expected: self.patch_size,
                found: session.patch_size(),
            });
        }

        let size = usize::from(self.patch_size);
        let mut coefficients = vec![0i32; self.tables.area()];
        let mut decoded = 0usize;
        loop {
            let header = session.decode_patch_header(packer, large_patch)?;
            if header.is_end_of_patches() {
                break;
            }
            if decoded >= self.limits.max_patches_per_group {
                return Err(DispatchError::TooManyPatches {
                    limit: self.limits.max_patches_per_group,
                });
            }

            let (x, y) = header.patch_position(large_patch);
            if x >= self.patches_per_edge || y >= self.patches_per_edge {
                return Err(DispatchError::PatchOutOfRange {
                    x,
                    y,
                    patches_per_edge: self.patches_per_edge,
                });
            }

            session.decode_patch(packer, &mut coefficients)?;
            let origin = y as usize * size * self.grids_per_edge + x as usize * size;
            self.tables.decompress_patch(
                &coefficients,
                &header,
                self.grids_per_edge,
                &mut self.heights[origin..],
            )?;
            self.received[(y * self.patches_per_edge + x) as usize] = true;
            decoded += 1;
            trace!("land patch ({x}, {y}) dc {} range {}", header.dc_offset, header.range);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wire::{GroupHeader, PatchHeader};

    fn land_packet(
        surface_patches: u32,
        patch_size: u8,
        positions: &[(u32, u32)],
        height: f32,
    ) -> Vec<u8> {
        let tables = DctTables::new(patch_size).unwrap();
        let area = tables.area();
        let heights = vec![height; area];
        let size = usize::from(patch_size);
        let stride = surface_patches as usize * size + 1;

        let mut packer = BitPacker::with_capacity(64 * 1024);
        let mut session = CodecSession::new();
        session
            .code_group_header(
                &mut packer,
                &GroupHeader::new(stride as u16, patch_size, b'L'),
            )
            .unwrap();
        for &(x, y) in positions {
            let (dc_offset, range) = codec::prescan_patch(&heights, size, size);
            let mut header = PatchHeader {
                dc_offset,
                range,
                patch_ids: PatchHeader::pack_position(x, y, false),
                ..PatchHeader::default()
            };
            let coefficients = tables
                .compress_patch(&heights, size, &mut header, 12)
                .unwrap();
            session
                .code_patch_header(&mut packer, &mut header, &coefficients, false)
                .unwrap();
            session.code_patch(&mut packer, &coefficients, 0).unwrap();
        }
        session.code_end_of_data(&mut packer).unwrap();
        packer.flush().unwrap();
        packer.into_bytes()
    }

    fn decode_into(surface: &mut Surface, bytes: Vec<u8>) -> DispatchResult<()> {
        let mut packer = BitPacker::from_bytes(bytes);
        let mut session = CodecSession::new();
        session.decode_group_header(&mut packer)?;
        surface.decompress(&mut packer, &mut session, false)
    }

    #[test]
    fn new_surface_is_flat_and_empty() {
        let surface = Surface::new(4, 8).unwrap();
        assert_eq!(surface.grids_per_edge(), 33);
        assert_eq!(surface.heights().len(), 33 * 33);
        assert_eq!(surface.received_count(), 0);
        assert_eq!(surface.height_at(32, 32), Some(0.0));
        assert_eq!(surface.height_at(33, 0), None);
    }

    #[test]
    fn bad_patch_size_is_rejected() {
        assert!(Surface::new(4, 0).is_err());
        assert!(Surface::new(4, 64).is_err());
    }

    #[test]
    fn decoded_patches_land_at_their_position() {
        let mut surface = Surface::new(4, 8).unwrap();
        decode_into(&mut surface, land_packet(4, 8, &[(1, 2), (3, 0)], 25.0)).unwrap();

        assert!(surface.patch_received(1, 2));
        assert!(surface.patch_received(3, 0));
        assert!(!surface.patch_received(0, 0));
        assert_eq!(surface.received_count(), 2);

        // Patch (1, 2) covers grid x 8..16, y 16..24.
        let inside = surface.height_at(10, 18).unwrap();
        assert!((inside - 25.0).abs() < 0.01, "got {inside}");
        assert_eq!(surface.height_at(2, 2), Some(0.0));
    }

    #[test]
    fn out_of_range_patch_abandons_the_rest() {
        let mut surface = Surface::new(2, 8).unwrap();
        let err =
            decode_into(&mut surface, land_packet(2, 8, &[(0, 0), (2, 0), (1, 1)], 5.0))
                .unwrap_err();
        assert_eq!(
            err,
            DispatchError::PatchOutOfRange {
                x: 2,
                y: 0,
                patches_per_edge: 2
            }
        );
        assert!(surface.patch_received(0, 0));
        assert!(!surface.patch_received(1, 1));
    }

    #[test]
    fn patch_size_must_match() {
        let mut surface = Surface::new(4, 16).unwrap();
        assert_eq!(
            decode_into(&mut surface, land_packet(4, 8, &[(0, 0)], 1.0)),
            Err(DispatchError::PatchSizeMismatch {
                expected: 16,
                found: 8
            })
        );
    }

    #[test]
    fn patch_count_is_bounded() {
        let limits = Limits {
            max_patches_per_group: 2,
            ..Limits::for_testing()
        };
        let mut surface = Surface::with_limits(4, 4, limits).unwrap();
        let err = decode_into(
            &mut surface,
            land_packet(4, 4, &[(0, 0), (1, 0), (2, 0)], 1.0),
        )
        .unwrap_err();
        assert_eq!(err, DispatchError::TooManyPatches { limit: 2 });
        assert_eq!(surface.received_count(), 2);
    }
}
