//! In-memory voxel flag buffer backed by ndarray.

use std::collections::HashMap;

use ndarray::Array3;

use super::VoxelStore;
use crate::codec::Flag;
use crate::constants::BACKGROUND_FLAG;
use crate::error::{EngineError, Result};
use crate::model::{BoundingBox3, Voxel};

/// Flag buffer for a segmented volume.
///
/// Arrays are indexed `[z, y, x]`. Each non-zero label in the segmentation is
/// one object; its voxels are collected once at construction so writes never
/// flood-fill.
#[derive(Debug, Clone)]
pub struct VoxelVolume {
    flags: Array3<Flag>,
    labels: Array3<u32>,
    /// First voxel of each label
    first_of_label: HashMap<u32, Voxel>,
    /// All voxels of each object, keyed by first voxel
    components: HashMap<Voxel, Vec<Voxel>>,
    /// Dirty flag - set by writes, cleared by repaint.
    dirty: bool,
    repaint_count: u64,
}

impl VoxelVolume {
    /// Build from a label volume (`[z, y, x]`, 0 = background).
    /// All flags start as background until the engine paints them.
    pub fn from_labels(labels: Array3<u32>) -> Self {
        let mut first_of_label: HashMap<u32, Voxel> = HashMap::new();
        let mut components: HashMap<Voxel, Vec<Voxel>> = HashMap::new();

        // Logical iteration order is raster order (x fastest)
        for ((z, y, x), &label) in labels.indexed_iter() {
            if label == 0 {
                continue;
            }
            let voxel = Voxel::new(x, y, z);
            let first = *first_of_label.entry(label).or_insert(voxel);
            components.entry(first).or_default().push(voxel);
        }

        log::debug!(
            "Voxel volume {:?} with {} objects",
            labels.dim(),
            components.len()
        );

        Self {
            flags: Array3::from_elem(labels.raw_dim(), BACKGROUND_FLAG),
            labels,
            first_of_label,
            components,
            dirty: true,
            repaint_count: 0,
        }
    }

    /// First voxels of all objects in raster order.
    pub fn first_voxels(&self) -> Vec<Voxel> {
        let mut firsts: Vec<Voxel> = self.components.keys().copied().collect();
        firsts.sort_by_key(|v| (v.z, v.y, v.x));
        firsts
    }

    /// Voxels belonging to the object starting at `first_voxel`.
    pub fn component(&self, first_voxel: Voxel) -> Option<&[Voxel]> {
        self.components.get(&first_voxel).map(Vec::as_slice)
    }

    /// Segmentation labels.
    pub fn labels(&self) -> &Array3<u32> {
        &self.labels
    }

    /// Current flag buffer.
    pub fn flags(&self) -> &Array3<Flag> {
        &self.flags
    }

    /// Number of repaints that published pending writes.
    pub fn repaint_count(&self) -> u64 {
        self.repaint_count
    }

    /// Check if there are writes not yet repainted.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

impl VoxelStore for VoxelVolume {
    fn dimensions(&self) -> (usize, usize, usize) {
        let (z, y, x) = self.flags.dim();
        (x, y, z)
    }

    fn read_flag(&self, voxel: Voxel) -> Option<Flag> {
        self.flags.get([voxel.z, voxel.y, voxel.x]).copied()
    }

    fn first_voxel_of(&self, voxel: Voxel) -> Option<Voxel> {
        let label = *self.labels.get([voxel.z, voxel.y, voxel.x])?;
        if label == 0 {
            return None;
        }
        self.first_of_label.get(&label).copied()
    }

    fn write_flag_for_object(&mut self, first_voxel: Voxel, flag: Flag) -> Result<usize> {
        let voxels = self
            .components
            .get(&first_voxel)
            .ok_or(EngineError::NoObjectAtVoxel(first_voxel))?;
        for v in voxels {
            self.flags[[v.z, v.y, v.x]] = flag;
        }
        self.dirty = true;
        Ok(voxels.len())
    }

    fn bounding_box(&self, first_voxel: Voxel) -> Option<BoundingBox3> {
        let voxels = self.components.get(&first_voxel)?;
        let mut bbox = BoundingBox3::from_voxel(first_voxel);
        for v in voxels {
            bbox.include(*v);
        }
        Some(bbox)
    }

    fn repaint(&mut self) {
        if self.dirty {
            self.dirty = false;
            self.repaint_count += 1;
            log::trace!("Repaint #{}", self.repaint_count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two objects: an L-shape (label 5) and a single voxel (label 2).
    fn sample_labels() -> Array3<u32> {
        let mut labels = Array3::zeros((2, 3, 4));
        labels[[0, 0, 1]] = 5;
        labels[[0, 1, 1]] = 5;
        labels[[1, 1, 2]] = 5;
        labels[[1, 2, 3]] = 2;
        labels
    }

    #[test]
    fn test_first_voxels_in_raster_order() {
        let volume = VoxelVolume::from_labels(sample_labels());
        assert_eq!(
            volume.first_voxels(),
            vec![Voxel::new(1, 0, 0), Voxel::new(3, 2, 1)]
        );
        assert_eq!(volume.dimensions(), (4, 3, 2));
        assert_eq!(
            volume.first_voxel_of(Voxel::new(2, 1, 1)),
            Some(Voxel::new(1, 0, 0))
        );
        assert_eq!(volume.first_voxel_of(Voxel::new(0, 0, 0)), None);
        assert_eq!(volume.first_voxel_of(Voxel::new(9, 0, 0)), None);
    }

    #[test]
    fn test_write_touches_whole_object() {
        let mut volume = VoxelVolume::from_labels(sample_labels());
        let written = volume
            .write_flag_for_object(Voxel::new(1, 0, 0), 7)
            .unwrap();
        assert_eq!(written, 3);
        assert_eq!(volume.read_flag(Voxel::new(2, 1, 1)), Some(7));
        assert_eq!(volume.read_flag(Voxel::new(3, 2, 1)), Some(BACKGROUND_FLAG));
        assert_eq!(volume.read_flag(Voxel::new(4, 0, 0)), None);

        assert!(matches!(
            volume.write_flag_for_object(Voxel::new(0, 0, 0), 7),
            Err(EngineError::NoObjectAtVoxel(_))
        ));
    }

    #[test]
    fn test_bounding_box() {
        let volume = VoxelVolume::from_labels(sample_labels());
        let bbox = volume.bounding_box(Voxel::new(1, 0, 0)).unwrap();
        assert_eq!(bbox.min, Voxel::new(1, 0, 0));
        assert_eq!(bbox.max, Voxel::new(2, 1, 1));
    }

    #[test]
    fn test_repaint_clears_dirty() {
        let mut volume = VoxelVolume::from_labels(sample_labels());
        volume.repaint();
        assert!(!volume.is_dirty());
        volume.repaint();
        assert_eq!(volume.repaint_count(), 1);

        volume
            .write_flag_for_object(Voxel::new(3, 2, 1), 4)
            .unwrap();
        assert!(volume.is_dirty());
        volume.repaint();
        assert_eq!(volume.repaint_count(), 2);
    }
}
