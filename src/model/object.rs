//! Object record types and voxel geometry.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Attribute, ClassTriple};

/// Stable 1-based identifier of a segmented object within one image.
pub type ObjectNumber = u32;

/// Integer voxel coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Voxel {
    pub x: usize,
    pub y: usize,
    pub z: usize,
}

impl Voxel {
    pub fn new(x: usize, y: usize, z: usize) -> Self {
        Self { x, y, z }
    }
}

impl fmt::Display for Voxel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// An axis-aligned voxel bounding box (inclusive on both ends).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox3 {
    pub min: Voxel,
    pub max: Voxel,
}

impl BoundingBox3 {
    /// Create a box containing a single voxel.
    pub fn from_voxel(voxel: Voxel) -> Self {
        Self {
            min: voxel,
            max: voxel,
        }
    }

    /// Grow the box to include a voxel.
    pub fn include(&mut self, voxel: Voxel) {
        self.min.x = self.min.x.min(voxel.x);
        self.min.y = self.min.y.min(voxel.y);
        self.min.z = self.min.z.min(voxel.z);
        self.max.x = self.max.x.max(voxel.x);
        self.max.y = self.max.y.max(voxel.y);
        self.max.z = self.max.z.max(voxel.z);
    }

    /// Edge lengths in voxels as (x, y, z).
    pub fn extent(&self) -> (usize, usize, usize) {
        (
            self.max.x - self.min.x + 1,
            self.max.y - self.min.y + 1,
            self.max.z - self.min.z + 1,
        )
    }

    /// Check if a voxel is inside the box.
    pub fn contains(&self, voxel: &Voxel) -> bool {
        voxel.x >= self.min.x
            && voxel.x <= self.max.x
            && voxel.y >= self.min.y
            && voxel.y <= self.max.y
            && voxel.z >= self.min.z
            && voxel.z <= self.max.z
    }
}

/// One row of the object table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectRecord {
    /// Stable object number (1-based)
    pub number: ObjectNumber,
    /// First voxel of the object in raster order; join key into the voxel store
    pub first_voxel: Voxel,
    /// Measures indexed by `Attribute::index`
    pub attributes: [f64; Attribute::COUNT],
    /// Current classification on all three axes
    pub classes: ClassTriple,
}

impl ObjectRecord {
    /// Create an unclassified record that passes every filter.
    pub fn new(number: ObjectNumber, first_voxel: Voxel) -> Self {
        Self {
            number,
            first_voxel,
            attributes: [0.0; Attribute::COUNT],
            classes: ClassTriple::default(),
        }
    }

    /// Set one attribute value.
    pub fn with_attribute(mut self, attribute: Attribute, value: f64) -> Self {
        self.attributes[attribute.index()] = value;
        self
    }

    /// Set the classification triple.
    pub fn with_classes(mut self, classes: ClassTriple) -> Self {
        self.classes = classes;
        self
    }

    /// Get one attribute value.
    pub fn attribute(&self, attribute: Attribute) -> f64 {
        self.attributes[attribute.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_box_include() {
        let mut bbox = BoundingBox3::from_voxel(Voxel::new(5, 5, 5));
        bbox.include(Voxel::new(2, 8, 5));
        bbox.include(Voxel::new(6, 4, 9));

        assert_eq!(bbox.min, Voxel::new(2, 4, 5));
        assert_eq!(bbox.max, Voxel::new(6, 8, 9));
        assert_eq!(bbox.extent(), (5, 5, 5));
        assert!(bbox.contains(&Voxel::new(3, 4, 9)));
        assert!(!bbox.contains(&Voxel::new(1, 4, 9)));
    }

    #[test]
    fn test_record_builder() {
        let record = ObjectRecord::new(3, Voxel::new(1, 2, 3)).with_attribute(Attribute::Volume, 27.0);
        assert_eq!(record.attribute(Attribute::Volume), 27.0);
        assert_eq!(record.attribute(Attribute::Elongation), 0.0);
        assert_eq!(record.classes, ClassTriple::default());
    }
}
