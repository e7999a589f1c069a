//! In-memory object table.

use serde::{Deserialize, Serialize};

use super::TableStore;
use crate::error::{EngineError, Result};
use crate::model::{
    Attribute, Axis, ClassTriple, FilterClass, ObjectClass, ObjectNumber, ObjectRecord, Voxel,
};

/// Object records of one image, numbered `1..=N`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectTable {
    records: Vec<ObjectRecord>,
}

impl ObjectTable {
    /// Create a table, numbering the records `1..=N` in the given order.
    pub fn new(mut records: Vec<ObjectRecord>) -> Self {
        for (i, record) in records.iter_mut().enumerate() {
            record.number = i as ObjectNumber + 1;
        }
        Self { records }
    }

    /// Get a record by object number.
    pub fn record(&self, object: ObjectNumber) -> Option<&ObjectRecord> {
        let index = (object as usize).checked_sub(1)?;
        self.records.get(index)
    }

    fn record_mut(&mut self, object: ObjectNumber) -> Result<&mut ObjectRecord> {
        (object as usize)
            .checked_sub(1)
            .and_then(|index| self.records.get_mut(index))
            .ok_or(EngineError::UnknownObject(object))
    }

    /// Get all records.
    pub fn records(&self) -> &[ObjectRecord] {
        &self.records
    }

    /// Check if there are no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Export the table to JSON string.
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Import a table from JSON string.
    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        let table: Self = serde_json::from_str(json)?;
        Ok(Self::new(table.records))
    }
}

impl TableStore for ObjectTable {
    fn row_count(&self) -> usize {
        self.records.len()
    }

    fn attribute(&self, object: ObjectNumber, attribute: Attribute) -> Option<f64> {
        self.record(object).map(|r| r.attribute(attribute))
    }

    fn classes(&self, object: ObjectNumber) -> Option<ClassTriple> {
        self.record(object).map(|r| r.classes)
    }

    fn first_voxel(&self, object: ObjectNumber) -> Option<Voxel> {
        self.record(object).map(|r| r.first_voxel)
    }

    fn set_axis(&mut self, object: ObjectNumber, axis: Axis, index: usize) -> Result<()> {
        let record = self.record_mut(object)?;
        let invalid = |cardinality: usize| EngineError::InvalidAxisValue {
            axis,
            index,
            cardinality,
        };
        match axis {
            Axis::Manual => {
                record.classes.manual =
                    ObjectClass::from_index(index).ok_or(invalid(ObjectClass::ALL.len()))?;
            }
            Axis::Filter => {
                record.classes.filter =
                    FilterClass::from_index(index).ok_or(invalid(FilterClass::ALL.len()))?;
            }
            Axis::Classifier => {
                record.classes.classifier =
                    ObjectClass::from_index(index).ok_or(invalid(ObjectClass::ALL.len()))?;
            }
        }
        Ok(())
    }
}
