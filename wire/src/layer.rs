//! Layer type codes carried by layer packets and group headers.

/// Coarse layer category used for routing and telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LayerCategory {
    Land,
    Water,
    Wind,
    Cloud,
}

/// Known layer type codes.
///
/// Extended codes are sent by regions whose size differs from the standard
/// 256 m edge; extended land uses 32-bit patch ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LayerType {
    Land,
    Water,
    Wind,
    Cloud,
    ExtendedLand,
    ExtendedWater,
    ExtendedWind,
    ExtendedCloud,
}

impl LayerType {
    /// Every known layer type.
    pub const ALL: [Self; 8] = [
        Self::Land,
        Self::Water,
        Self::Wind,
        Self::Cloud,
        Self::ExtendedLand,
        Self::ExtendedWater,
        Self::ExtendedWind,
        Self::ExtendedCloud,
    ];

    /// Maps a raw type code to a layer type.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            b'L' => Some(Self::Land),
            b'W' => Some(Self::Water),
            b'7' => Some(Self::Wind),
            b'8' => Some(Self::Cloud),
            b'M' => Some(Self::ExtendedLand),
            b'X' => Some(Self::ExtendedWater),
            b'9' => Some(Self::ExtendedWind),
            b':' => Some(Self::ExtendedCloud),
            _ => None,
        }
    }

    /// Returns the raw type code.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Land => b'L',
            Self::Water => b'W',
            Self::Wind => b'7',
            Self::Cloud => b'8',
            Self::ExtendedLand => b'M',
            Self::ExtendedWater => b'X',
            Self::ExtendedWind => b'9',
            Self::ExtendedCloud => b':',
        }
    }

    /// Returns the routing category.
    #[must_use]
    pub const fn category(self) -> LayerCategory {
        match self {
            Self::Land | Self::ExtendedLand => LayerCategory::Land,
            Self::Water | Self::ExtendedWater => LayerCategory::Water,
            Self::Wind | Self::ExtendedWind => LayerCategory::Wind,
            Self::Cloud | Self::ExtendedCloud => LayerCategory::Cloud,
        }
    }

    /// Returns `true` for variable-size region codes.
    #[must_use]
    pub const fn is_extended(self) -> bool {
        matches!(
            self,
            Self::ExtendedLand | Self::ExtendedWater | Self::ExtendedWind | Self::ExtendedCloud
        )
    }

    /// Returns `true` if patch ids are sent in 32 bits.
    #[must_use]
    pub const fn large_patch(self) -> bool {
        matches!(self, Self::ExtendedLand)
    }
}
