//! Running counts of manually classified objects.

use serde::Serialize;

use crate::model::ManualClass;
use crate::store::TableStore;

/// Counters over the manual axis of one image.
///
/// Built by a full scan when an image is loaded and afterwards only changed
/// through [`ClassificationStats::adjust`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClassificationStats {
    pub feature: usize,
    pub non_feature: usize,
    pub connected: usize,
    pub total: usize,
}

impl ClassificationStats {
    /// Count every row of a table.
    pub fn from_table(table: &dyn TableStore) -> Self {
        let mut stats = Self::default();
        for object in table.object_numbers() {
            if let Some(classes) = table.classes(object) {
                stats.total += 1;
                if let Some(counter) = stats.counter_mut(classes.manual) {
                    *counter += 1;
                }
            }
        }
        stats
    }

    fn counter_mut(&mut self, class: ManualClass) -> Option<&mut usize> {
        match class {
            ManualClass::Unclassified => None,
            ManualClass::Feature => Some(&mut self.feature),
            ManualClass::NonFeature => Some(&mut self.non_feature),
            ManualClass::Connected => Some(&mut self.connected),
        }
    }

    /// Record one manual reclassification. `total` is unchanged.
    pub fn adjust(&mut self, old: ManualClass, new: ManualClass) {
        if let Some(counter) = self.counter_mut(old) {
            if *counter == 0 {
                log::warn!("Classification count for {} would underflow", old);
            }
            *counter = counter.saturating_sub(1);
        }
        if let Some(counter) = self.counter_mut(new) {
            *counter += 1;
        }
    }

    /// Objects with no manual class.
    pub fn unclassified(&self) -> usize {
        self.total
            .saturating_sub(self.feature + self.non_feature + self.connected)
    }

    /// Objects with any manual class.
    pub fn classified(&self) -> usize {
        self.feature + self.non_feature + self.connected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ClassTriple, FilterClass, ObjectClass, ObjectRecord, Voxel};
    use crate::store::ObjectTable;

    fn table_with(manual: &[ManualClass]) -> ObjectTable {
        ObjectTable::new(
            manual
                .iter()
                .enumerate()
                .map(|(i, class)| {
                    ObjectRecord::new(i as u32 + 1, Voxel::new(i * 3, 0, 0)).with_classes(
                        ClassTriple::new(*class, FilterClass::Passed, ObjectClass::Feature),
                    )
                })
                .collect(),
        )
    }

    #[test]
    fn test_from_table() {
        let table = table_with(&[
            ObjectClass::Feature,
            ObjectClass::Feature,
            ObjectClass::Connected,
            ObjectClass::Unclassified,
        ]);
        let stats = ClassificationStats::from_table(&table);
        assert_eq!(stats.feature, 2);
        assert_eq!(stats.non_feature, 0);
        assert_eq!(stats.connected, 1);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.unclassified(), 1);
    }

    #[test]
    fn test_adjust_matches_recount() {
        let mut table = table_with(&[ObjectClass::Unclassified; 5]);
        let mut stats = ClassificationStats::from_table(&table);

        let transitions = [
            (1, ObjectClass::Feature),
            (2, ObjectClass::NonFeature),
            (1, ObjectClass::Connected),
            (3, ObjectClass::Feature),
            (2, ObjectClass::Unclassified),
            (5, ObjectClass::NonFeature),
        ];
        for (object, new) in transitions {
            let old = table.classes(object).unwrap().manual;
            stats.adjust(old, new);
            table
                .set_axis(object, crate::model::Axis::Manual, new.index())
                .unwrap();
        }

        assert_eq!(stats, ClassificationStats::from_table(&table));
        assert_eq!(stats.total, 5);
    }

    #[test]
    fn test_adjust_never_underflows() {
        let mut stats = ClassificationStats {
            total: 1,
            ..Default::default()
        };
        stats.adjust(ObjectClass::Feature, ObjectClass::NonFeature);
        assert_eq!(stats.feature, 0);
        assert_eq!(stats.non_feature, 1);
    }
}
