//! Per-region layer bundle and the registry that owns live regions.

use std::collections::HashMap;

use bitstream::BitPacker;
use codec::CodecSession;
use wire::Limits;

use crate::atmosphere::{CloudLayer, WindLayer};
use crate::dispatcher::{LayerDispatcher, RegionLookup, RegionSinks};
use crate::error::DispatchResult;
use crate::surface::Surface;
use crate::types::RegionHandle;

/// Land, wind and cloud layers of one region.
#[derive(Debug, Clone)]
pub struct RegionLayers {
    surface: Surface,
    wind: WindLayer,
    cloud: CloudLayer,
}

impl RegionLayers {
    /// Creates the layers of a region with `patches_per_edge²` land patches.
    pub fn new(patches_per_edge: u32, patch_size: u8) -> DispatchResult<Self> {
        Ok(Self::from_surface(Surface::new(patches_per_edge, patch_size)?))
    }

    /// Creates the layers of a region with explicit decode limits.
    pub fn with_limits(
        patches_per_edge: u32,
        patch_size: u8,
        limits: Limits,
    ) -> DispatchResult<Self> {
        Ok(Self::from_surface(Surface::with_limits(
            patches_per_edge,
            patch_size,
            limits,
        )?))
    }

    fn from_surface(surface: Surface) -> Self {
        Self {
            surface,
            wind: WindLayer::new(),
            cloud: CloudLayer::new(),
        }
    }

    #[must_use]
    pub const fn surface(&self) -> &Surface {
        &self.surface
    }

    #[must_use]
    pub const fn wind(&self) -> &WindLayer {
        &self.wind
    }

    #[must_use]
    pub const fn cloud(&self) -> &CloudLayer {
        &self.cloud
    }
}

impl RegionSinks for RegionLayers {
    fn decompress_land(
        &mut self,
        packer: &mut BitPacker,
        session: &mut CodecSession,
        large_patch: bool,
    ) -> DispatchResult<()> {
        self.surface.decompress(packer, session, large_patch)
    }

    fn decompress_wind(
        &mut self,
        packer: &mut BitPacker,
        session: &mut CodecSession,
    ) -> DispatchResult<()> {
        self.wind.decompress(packer, session)
    }

    fn decompress_cloud(
        &mut self,
        packer: &mut BitPacker,
        session: &mut CodecSession,
    ) -> DispatchResult<()> {
        self.cloud.decompress(packer, session)
    }
}

/// Live regions keyed by handle.
#[derive(Debug, Clone, Default)]
pub struct RegionRegistry {
    regions: HashMap<RegionHandle, RegionLayers>,
}

impl RegionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a region, returning the previous one.
    pub fn insert(&mut self, handle: RegionHandle, layers: RegionLayers) -> Option<RegionLayers> {
        self.regions.insert(handle, layers)
    }

    /// Removes a region and discards its queued layer packets.
    pub fn remove(
        &mut self,
        handle: RegionHandle,
        dispatcher: &mut LayerDispatcher,
    ) -> Option<RegionLayers> {
        dispatcher.cleanup_data(handle);
        self.regions.remove(&handle)
    }

    #[must_use]
    pub fn get(&self, handle: RegionHandle) -> Option<&RegionLayers> {
        self.regions.get(&handle)
    }

    #[must_use]
    pub fn contains(&self, handle: RegionHandle) -> bool {
        self.regions.contains_key(&handle)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

impl RegionLookup for RegionRegistry {
    type Sinks = RegionLayers;

    fn region_mut(&mut self, handle: RegionHandle) -> Option<&mut RegionLayers> {
        self.regions.get_mut(&handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_lookup() {
        let mut registry = RegionRegistry::new();
        let handle = RegionHandle::new(5);
        assert!(registry.is_empty());
        assert!(registry
            .insert(handle, RegionLayers::new(16, 16).unwrap())
            .is_none());
        assert!(registry.contains(handle));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(handle).unwrap().surface().patches_per_edge(), 16);
        assert!(registry.region_mut(RegionHandle::new(6)).is_none());
    }

    #[test]
    fn remove_discards_queued_packets() {
        let mut registry = RegionRegistry::new();
        let mut dispatcher = LayerDispatcher::new(Limits::default());
        let a = RegionHandle::new(1);
        let b = RegionHandle::new(2);
        registry.insert(a, RegionLayers::new(4, 16).unwrap());
        registry.insert(b, RegionLayers::new(4, 16).unwrap());
        dispatcher.add_layer_data(b'L', vec![16, 0, 16, b'L'], a, 4);
        dispatcher.add_layer_data(b'L', vec![16, 0, 16, b'L'], b, 4);

        assert!(registry.remove(a, &mut dispatcher).is_some());
        assert_eq!(dispatcher.len(), 1);
        assert_eq!(dispatcher.queued()[0].region(), b);
        assert!(!registry.contains(a));
    }
}
