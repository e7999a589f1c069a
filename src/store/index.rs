//! First-voxel to object-number lookup.

use std::collections::HashMap;

use super::TableStore;
use crate::model::{ObjectNumber, Voxel};

/// Map from each object's first voxel to its object number.
/// Built once per image load and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct ObjectIndex {
    by_voxel: HashMap<Voxel, ObjectNumber>,
}

impl ObjectIndex {
    /// Build the index from every row of a table.
    pub fn from_table(table: &dyn TableStore) -> Self {
        let by_voxel: HashMap<Voxel, ObjectNumber> = table
            .object_numbers()
            .filter_map(|object| Some((table.first_voxel(object)?, object)))
            .collect();
        if by_voxel.len() != table.row_count() {
            log::warn!(
                "{} objects share a first voxel with another object",
                table.row_count() - by_voxel.len()
            );
        }
        Self { by_voxel }
    }

    /// Object whose first voxel is `first_voxel`.
    pub fn lookup(&self, first_voxel: Voxel) -> Option<ObjectNumber> {
        self.by_voxel.get(&first_voxel).copied()
    }

    /// Get the number of indexed objects.
    pub fn len(&self) -> usize {
        self.by_voxel.len()
    }

    /// Check if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.by_voxel.is_empty()
    }
}
