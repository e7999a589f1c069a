//! Classification axes and their value sets.
//!
//! Every object carries exactly one value on each of three independent axes:
//! the manual annotation, the attribute filter result and the statistical
//! classifier output. The value sets are fixed; each value has a stable index
//! used by the flag codec.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the three independent classification dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// Manual annotation by the user
    Manual,
    /// Attribute-range filter result
    Filter,
    /// Statistical classifier output
    Classifier,
}

impl Axis {
    /// All axes in codec order (least significant first).
    pub const ALL: [Axis; 3] = [Axis::Manual, Axis::Filter, Axis::Classifier];

    /// Position of this axis in codec order.
    pub fn position(self) -> usize {
        match self {
            Axis::Manual => 0,
            Axis::Filter => 1,
            Axis::Classifier => 2,
        }
    }

    /// Get the display name for this axis.
    pub fn name(self) -> &'static str {
        match self {
            Axis::Manual => "manual",
            Axis::Filter => "filter",
            Axis::Classifier => "classifier",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Class value shared by the manual and classifier axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectClass {
    /// Not yet classified
    #[default]
    Unclassified,
    /// Object of interest
    Feature,
    /// Not an object of interest
    NonFeature,
    /// Several touching features segmented as one object
    Connected,
}

/// Value set of the manual axis.
pub type ManualClass = ObjectClass;

/// Value set of the classifier axis.
pub type ClassifierClass = ObjectClass;

impl ObjectClass {
    /// All values in index order.
    pub const ALL: [ObjectClass; 4] = [
        ObjectClass::Unclassified,
        ObjectClass::Feature,
        ObjectClass::NonFeature,
        ObjectClass::Connected,
    ];

    /// Value index used by the codec.
    pub fn index(self) -> usize {
        match self {
            ObjectClass::Unclassified => 0,
            ObjectClass::Feature => 1,
            ObjectClass::NonFeature => 2,
            ObjectClass::Connected => 3,
        }
    }

    /// Look up a value by its codec index.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Get the display name for this class.
    pub fn name(self) -> &'static str {
        match self {
            ObjectClass::Unclassified => "Unclassified",
            ObjectClass::Feature => "Feature",
            ObjectClass::NonFeature => "Non-feature",
            ObjectClass::Connected => "Connected",
        }
    }
}

impl fmt::Display for ObjectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Value set of the filter axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterClass {
    /// Attribute value inside the active range (or no filter active)
    #[default]
    Passed,
    /// Attribute value outside the active range
    NotPassed,
}

impl FilterClass {
    /// All values in index order.
    pub const ALL: [FilterClass; 2] = [FilterClass::Passed, FilterClass::NotPassed];

    /// Value index used by the codec.
    pub fn index(self) -> usize {
        match self {
            FilterClass::Passed => 0,
            FilterClass::NotPassed => 1,
        }
    }

    /// Look up a value by its codec index.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Filter value for a pass/fail outcome.
    pub fn from_passed(passed: bool) -> Self {
        if passed {
            FilterClass::Passed
        } else {
            FilterClass::NotPassed
        }
    }
}

/// The complete classification state of one object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ClassTriple {
    pub manual: ManualClass,
    pub filter: FilterClass,
    pub classifier: ClassifierClass,
}

impl ClassTriple {
    pub fn new(manual: ManualClass, filter: FilterClass, classifier: ClassifierClass) -> Self {
        Self {
            manual,
            filter,
            classifier,
        }
    }

    /// Value index on one axis.
    pub fn index(&self, axis: Axis) -> usize {
        match axis {
            Axis::Manual => self.manual.index(),
            Axis::Filter => self.filter.index(),
            Axis::Classifier => self.classifier.index(),
        }
    }

    /// Value indices in codec order.
    pub fn indices(&self) -> [usize; 3] {
        [
            self.manual.index(),
            self.filter.index(),
            self.classifier.index(),
        ]
    }

    /// Build a triple from codec indices. Returns None if any index is unknown.
    pub fn from_indices(indices: [usize; 3]) -> Option<Self> {
        Some(Self {
            manual: ObjectClass::from_index(indices[0])?,
            filter: FilterClass::from_index(indices[1])?,
            classifier: ObjectClass::from_index(indices[2])?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_index_roundtrip() {
        for class in ObjectClass::ALL {
            assert_eq!(ObjectClass::from_index(class.index()), Some(class));
        }
        for class in FilterClass::ALL {
            assert_eq!(FilterClass::from_index(class.index()), Some(class));
        }
        assert_eq!(ObjectClass::from_index(4), None);
        assert_eq!(FilterClass::from_index(2), None);
    }

    #[test]
    fn test_triple_indices() {
        let triple = ClassTriple::new(
            ObjectClass::Connected,
            FilterClass::NotPassed,
            ObjectClass::Feature,
        );
        assert_eq!(triple.indices(), [3, 1, 1]);
        assert_eq!(triple.index(Axis::Filter), 1);
        assert_eq!(ClassTriple::from_indices([3, 1, 1]), Some(triple));
        assert_eq!(ClassTriple::from_indices([0, 2, 0]), None);
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&ObjectClass::NonFeature).unwrap();
        assert_eq!(json, "\"non_feature\"");
        let axis: Axis = serde_json::from_str("\"classifier\"").unwrap();
        assert_eq!(axis, Axis::Classifier);
    }
}
