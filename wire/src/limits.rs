//! Configurable limits for bounded decoding.

/// Limits applied to layer packets before and during decoding.
///
/// Layer packets arrive from a network peer, so every loop driven by their
/// contents is capped here rather than by the sentinel alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    /// Maximum size of one layer packet payload in bytes.
    pub max_packet_bytes: usize,

    /// Maximum number of patches decoded from a single group.
    pub max_patches_per_group: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            // Layer data travels in a variable-length field with a 16-bit size.
            max_packet_bytes: u16::MAX as usize,

            // A full packet of the smallest possible patches stays below this.
            max_patches_per_group: 8192,
        }
    }
}

impl Limits {
    /// Creates limits suitable for testing with smaller values.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            max_packet_bytes: 4096,
            max_patches_per_group: 64,
        }
    }

    /// Creates limits with no restrictions (use with caution).
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_packet_bytes: usize::MAX,
            max_patches_per_group: usize::MAX,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limits_packet_bytes() {
        let limits = Limits::default();
        assert_eq!(limits.max_packet_bytes, 65_535);
    }

    #[test]
    fn testing_limits_smaller() {
        let test_limits = Limits::for_testing();
        let default_limits = Limits::default();

        assert!(test_limits.max_packet_bytes < default_limits.max_packet_bytes);
        assert!(test_limits.max_patches_per_group < default_limits.max_patches_per_group);
    }

    #[test]
    fn unlimited_limits() {
        let limits = Limits::unlimited();
        assert_eq!(limits.max_packet_bytes, usize::MAX);
        assert_eq!(limits.max_patches_per_group, usize::MAX);
    }

    #[test]
    fn limits_const_constructible() {
        const LIMITS: Limits = Limits::for_testing();
        assert_eq!(LIMITS.max_patches_per_group, 64);
    }
}
