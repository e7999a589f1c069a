//! Numeric object measures.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A numeric measure recorded for every segmented object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    /// Number of voxels
    Volume,
    /// Number of exposed voxel faces
    SurfaceArea,
    /// Normalized volume-to-surface ratio (1.0 for a sphere)
    Compactness,
    /// Longest over shortest bounding-box extent
    Elongation,
    /// Mean voxel intensity
    MeanIntensity,
    /// Brightest voxel intensity
    MaxIntensity,
    /// Sum of voxel intensities
    IntegratedDensity,
}

impl Attribute {
    /// Number of attributes per object.
    pub const COUNT: usize = 7;

    /// All attributes in column order.
    pub const ALL: [Attribute; Attribute::COUNT] = [
        Attribute::Volume,
        Attribute::SurfaceArea,
        Attribute::Compactness,
        Attribute::Elongation,
        Attribute::MeanIntensity,
        Attribute::MaxIntensity,
        Attribute::IntegratedDensity,
    ];

    /// Column index of this attribute.
    pub fn index(self) -> usize {
        match self {
            Attribute::Volume => 0,
            Attribute::SurfaceArea => 1,
            Attribute::Compactness => 2,
            Attribute::Elongation => 3,
            Attribute::MeanIntensity => 4,
            Attribute::MaxIntensity => 5,
            Attribute::IntegratedDensity => 6,
        }
    }

    /// Look up an attribute by column index.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Get the display name for this attribute.
    pub fn name(self) -> &'static str {
        match self {
            Attribute::Volume => "Volume",
            Attribute::SurfaceArea => "Surface area",
            Attribute::Compactness => "Compactness",
            Attribute::Elongation => "Elongation",
            Attribute::MeanIntensity => "Mean intensity",
            Attribute::MaxIntensity => "Max intensity",
            Attribute::IntegratedDensity => "Integrated density",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
