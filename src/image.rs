//! State of one loaded image.
//!
//! Bundles the voxel buffer, the object table, the first-voxel index and the
//! classification statistics. All per-object axis changes go through
//! `ImageState::set_axis`, which writes the voxel flag and the table record
//! together and refuses to proceed if the two have drifted apart.

use crate::codec::{ClassificationCodec, Flag};
use crate::error::{EngineError, Result};
use crate::model::{Axis, ClassTriple, ObjectNumber, Voxel};
use crate::stats::ClassificationStats;
use crate::store::{ObjectIndex, TableStore, VoxelStore};

/// One image's voxels, records and bookkeeping.
pub struct ImageState {
    key: String,
    voxels: Box<dyn VoxelStore>,
    table: Box<dyn TableStore>,
    index: ObjectIndex,
    stats: ClassificationStats,
}

impl std::fmt::Debug for ImageState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageState")
            .field("key", &self.key)
            .field("objects", &self.table.row_count())
            .field("stats", &self.stats)
            .finish()
    }
}

impl ImageState {
    /// Wrap an image's stores, building the index and counting classes.
    pub fn new(
        key: impl Into<String>,
        voxels: Box<dyn VoxelStore>,
        table: Box<dyn TableStore>,
    ) -> Self {
        let index = ObjectIndex::from_table(table.as_ref());
        let stats = ClassificationStats::from_table(table.as_ref());
        Self {
            key: key.into(),
            voxels,
            table,
            index,
            stats,
        }
    }

    /// Identifier of the image (file name or similar).
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn voxels(&self) -> &dyn VoxelStore {
        self.voxels.as_ref()
    }

    pub fn table(&self) -> &dyn TableStore {
        self.table.as_ref()
    }

    pub fn index(&self) -> &ObjectIndex {
        &self.index
    }

    pub fn stats(&self) -> &ClassificationStats {
        &self.stats
    }

    pub(crate) fn stats_mut(&mut self) -> &mut ClassificationStats {
        &mut self.stats
    }

    /// Get the number of objects.
    pub fn object_count(&self) -> usize {
        self.table.row_count()
    }

    /// Object covering any voxel, with its first voxel.
    pub fn object_at(&self, voxel: Voxel) -> Result<(ObjectNumber, Voxel)> {
        let first = self
            .voxels
            .first_voxel_of(voxel)
            .ok_or(EngineError::NoObjectAtVoxel(voxel))?;
        let object = self
            .index
            .lookup(first)
            .ok_or(EngineError::NoObjectAtVoxel(voxel))?;
        Ok((object, first))
    }

    pub fn first_voxel(&self, object: ObjectNumber) -> Result<Voxel> {
        self.table
            .first_voxel(object)
            .ok_or(EngineError::UnknownObject(object))
    }

    /// Classification triple from the table record.
    pub fn classes(&self, object: ObjectNumber) -> Result<ClassTriple> {
        self.table
            .classes(object)
            .ok_or(EngineError::UnknownObject(object))
    }

    /// Flag at an object's first voxel.
    pub fn flag_of(&self, object: ObjectNumber) -> Result<Flag> {
        let first = self.first_voxel(object)?;
        self.voxels
            .read_flag(first)
            .ok_or(EngineError::NoObjectAtVoxel(first))
    }

    /// Verify that an object's voxel flag decodes to its record.
    pub fn check_consistency(&self, codec: &ClassificationCodec, object: ObjectNumber) -> Result<()> {
        let flag = self.flag_of(object)?;
        let classes = self.classes(object)?;
        match codec.decode_triple(flag) {
            Ok(decoded) if decoded == classes => Ok(()),
            _ => Err(EngineError::Desynchronized { object, flag }),
        }
    }

    /// Paint every object's flag from its record. Returns the object count.
    pub(crate) fn paint_all(&mut self, codec: &ClassificationCodec) -> Result<usize> {
        let mut painted = 0;
        for object in self.table.object_numbers() {
            let first = self.first_voxel(object)?;
            let flag = codec.encode_triple(&self.classes(object)?)?;
            self.voxels.write_flag_for_object(first, flag)?;
            painted += 1;
        }
        self.voxels.repaint();
        Ok(painted)
    }

    /// Change one axis of an object in both the voxel buffer and the table.
    ///
    /// The object must not be selected. Returns false if the axis already
    /// holds `index`.
    pub(crate) fn set_axis(
        &mut self,
        codec: &ClassificationCodec,
        object: ObjectNumber,
        axis: Axis,
        index: usize,
    ) -> Result<bool> {
        let classes = self.classes(object)?;
        if classes.index(axis) == index {
            return Ok(false);
        }
        self.check_consistency(codec, object)?;

        let first = self.first_voxel(object)?;
        let flag = self.flag_of(object)?;
        let updated = codec.with_axis(flag, axis, index)?;
        self.voxels.write_flag_for_object(first, updated)?;
        self.table.set_axis(object, axis, index)?;
        log::trace!("Object {} {} axis -> {} (flag {} -> {})", object, axis, index, flag, updated);
        Ok(true)
    }

    /// Write a raw flag into an object's voxels without touching the table.
    pub(crate) fn write_flag(&mut self, first_voxel: Voxel, flag: Flag) -> Result<usize> {
        self.voxels.write_flag_for_object(first_voxel, flag)
    }

    /// Set the table record of one axis without touching voxels.
    pub(crate) fn set_record_axis(
        &mut self,
        object: ObjectNumber,
        axis: Axis,
        index: usize,
    ) -> Result<()> {
        self.table.set_axis(object, axis, index)
    }

    pub fn repaint(&mut self) {
        self.voxels.repaint();
    }
}
