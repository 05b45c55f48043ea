//! Layer packet dispatch: decide where layer data goes, not how it is coded.
//!
//! A [`LayerDispatcher`] queues raw layer packets as they arrive, counts
//! their bits per layer category and, once per frame, decodes each packet's
//! group header and hands the rest to the owning region's decompressor.
//! Regions are addressed by [`RegionHandle`] and resolved through
//! [`RegionLookup`], so a region that went away simply drops its packets.
//!
//! [`RegionLayers`] and [`RegionRegistry`] are ready-made sinks that decode
//! land into a height [`Surface`] and wind and cloud into dense fields.

mod atmosphere;
mod dispatcher;
mod error;
mod region;
mod surface;
mod types;

pub use atmosphere::{CloudLayer, WindLayer};
pub use dispatcher::{
    LayerBitCounts, LayerDispatcher, QueuedPacket, RegionLookup, RegionSinks, UnpackReport,
};
pub use error::{DispatchError, DispatchResult};
pub use region::{RegionLayers, RegionRegistry};
pub use surface::Surface;
pub use types::RegionHandle;
