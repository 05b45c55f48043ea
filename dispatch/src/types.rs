//! Core types for the dispatcher.

/// A stable region identifier.
///
/// Handles are assigned by whoever owns the regions and stay valid as keys
/// after the region is gone; lookups for a removed region simply miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RegionHandle(u64);

impl RegionHandle {
    /// Creates a new region handle.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw handle value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl From<u64> for RegionHandle {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<RegionHandle> for u64 {
    fn from(handle: RegionHandle) -> Self {
        handle.0
    }
}
