//! Wind and cloud fields fed by single-patch groups.
//!
//! Both layers ignore the packed stride and lay each patch out densely,
//! one row per `patch_size` samples.

use bitstream::BitPacker;
use codec::{CodecSession, DctTables};
use log::trace;

use crate::error::{DispatchError, DispatchResult};

/// DCT tables for whatever patch size the last group used.
#[derive(Debug, Clone, Default)]
struct TableCache {
    tables: Option<DctTables>,
}

impl TableCache {
    fn get(&mut self, size: u8) -> DispatchResult<&DctTables> {
        let tables = match self.tables.take() {
            Some(tables) if tables.size() == usize::from(size) => tables,
            _ => DctTables::new(size)?,
        };
        let tables: &DctTables = self.tables.insert(tables);
        Ok(tables)
    }
}

/// Decodes one patch header and body into a dense `patch_size²` field.
fn decode_field(
    packer: &mut BitPacker,
    session: &mut CodecSession,
    tables: &DctTables,
    coefficients: &mut [i32],
    field: &mut Vec<f32>,
) -> DispatchResult<()> {
    let header = session.decode_patch_header(packer, false)?;
    if header.is_end_of_patches() {
        return Err(DispatchError::MissingPatch);
    }
    session.decode_patch(packer, coefficients)?;
    field.resize(tables.area(), 0.0);
    tables.decompress_patch(coefficients, &header, tables.size(), field)?;
    Ok(())
}

/// Wind velocity field: one patch per axis.
#[derive(Debug, Clone, Default)]
pub struct WindLayer {
    velocity_x: Vec<f32>,
    velocity_y: Vec<f32>,
    cache: TableCache,
    updates: u64,
}

impl WindLayer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// East-west velocity samples.
    #[must_use]
    pub fn velocity_x(&self) -> &[f32] {
        &self.velocity_x
    }

    /// North-south velocity samples.
    #[must_use]
    pub fn velocity_y(&self) -> &[f32] {
        &self.velocity_y
    }

    /// Number of wind groups applied.
    #[must_use]
    pub const fn updates(&self) -> u64 {
        self.updates
    }

    /// Decodes the x then y velocity patches of one group.
    pub fn decompress(
        &mut self,
        packer: &mut BitPacker,
        session: &mut CodecSession,
    ) -> DispatchResult<()> {
        let tables = self.cache.get(session.patch_size())?;
        let mut coefficients = vec![0i32; tables.area()];
        decode_field(packer, session, tables, &mut coefficients, &mut self.velocity_x)?;
        decode_field(packer, session, tables, &mut coefficients, &mut self.velocity_y)?;
        self.updates += 1;
        trace!("wind field updated ({} samples)", self.velocity_x.len());
        Ok(())
    }
}

/// Cloud density field: one patch per group.
#[derive(Debug, Clone, Default)]
pub struct CloudLayer {
    density: Vec<f32>,
    cache: TableCache,
    updates: u64,
}

impl CloudLayer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Density samples.
    #[must_use]
    pub fn density(&self) -> &[f32] {
        &self.density
    }

    /// Number of cloud groups applied.
    #[must_use]
    pub const fn updates(&self) -> u64 {
        self.updates
    }

    /// Decodes the density patch of one group.
    pub fn decompress(
        &mut self,
        packer: &mut BitPacker,
        session: &mut CodecSession,
    ) -> DispatchResult<()> {
        let tables = self.cache.get(session.patch_size())?;
        let mut coefficients = vec![0i32; tables.area()];
        decode_field(packer, session, tables, &mut coefficients, &mut self.density)?;
        self.updates += 1;
        trace!("cloud density updated ({} samples)", self.density.len());
        Ok(())
    }
}
