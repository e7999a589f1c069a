//! Boundary contracts for the image buffer and the object table.
//!
//! The engine never owns pixels or rows directly; it reads and writes them
//! through [`VoxelStore`] and [`TableStore`]. In-memory implementations are
//! provided for the demo binary and tests.

mod index;
mod table;
mod volume;

pub use index::ObjectIndex;
pub use table::ObjectTable;
pub use volume::VoxelVolume;

use std::ops::RangeInclusive;

use crate::codec::Flag;
use crate::error::Result;
use crate::model::{Attribute, Axis, BoundingBox3, ClassTriple, ObjectNumber, Voxel};

/// Per-voxel flag buffer of one image.
pub trait VoxelStore: Send {
    /// Volume size as (x, y, z).
    fn dimensions(&self) -> (usize, usize, usize);

    /// Flag at a voxel. Returns None outside the volume.
    fn read_flag(&self, voxel: Voxel) -> Option<Flag>;

    /// First voxel (raster order) of the object covering `voxel`.
    fn first_voxel_of(&self, voxel: Voxel) -> Option<Voxel>;

    /// Write `flag` into every voxel of the object starting at `first_voxel`.
    /// Returns the number of voxels written.
    fn write_flag_for_object(&mut self, first_voxel: Voxel, flag: Flag) -> Result<usize>;

    /// Bounding box of the object starting at `first_voxel`.
    fn bounding_box(&self, first_voxel: Voxel) -> Option<BoundingBox3>;

    /// Publish pending writes to the display.
    fn repaint(&mut self);
}

/// Tabular object records of one image.
pub trait TableStore: Send {
    /// Number of objects.
    fn row_count(&self) -> usize;

    /// Value of one attribute for an object.
    fn attribute(&self, object: ObjectNumber, attribute: Attribute) -> Option<f64>;

    /// Current classification triple of an object.
    fn classes(&self, object: ObjectNumber) -> Option<ClassTriple>;

    /// First voxel of an object.
    fn first_voxel(&self, object: ObjectNumber) -> Option<Voxel>;

    /// Set the value index of one axis for an object.
    fn set_axis(&mut self, object: ObjectNumber, axis: Axis, index: usize) -> Result<()>;

    /// All object numbers, ascending.
    fn object_numbers(&self) -> RangeInclusive<ObjectNumber> {
        1..=self.row_count() as ObjectNumber
    }

    /// Objects ordered by ascending attribute value.
    fn sorted_by(&self, attribute: Attribute) -> Vec<(f64, ObjectNumber)> {
        let mut order: Vec<(f64, ObjectNumber)> = self
            .object_numbers()
            .filter_map(|object| Some((self.attribute(object, attribute)?, object)))
            .collect();
        order.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        order
    }

    /// Attribute values of an object in the order given.
    fn feature_vector(&self, object: ObjectNumber, features: &[Attribute]) -> Option<Vec<f64>> {
        features
            .iter()
            .map(|attribute| self.attribute(object, *attribute))
            .collect()
    }
}
