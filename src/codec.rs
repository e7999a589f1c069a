//! Classification flag codec.
//!
//! Packs a `(manual, filter, classifier)` value-index triple into a single
//! integer flag using mixed-radix positional encoding, manual axis least
//! significant:
//!
//! ```text
//! flag = base + manual + M * (filter + F * classifier)
//! ```
//!
//! Directly above the `M * F * C` classification flags the codec reserves
//! `M + 1` selection markers: one per manual value (used while an object is
//! selected, so the highlight still shows its manual class) and one uniform
//! highlight. Flag `0` is background and never produced.

use crate::constants::DEFAULT_FLAG_BASE;
use crate::error::{EngineError, Result};
use crate::model::{Axis, ClassTriple, FilterClass, ObjectClass};

/// Integer stored per voxel in the image buffer.
pub type Flag = u32;

const STANDARD_CARDINALITIES: [usize; 3] = [
    ObjectClass::ALL.len(),
    FilterClass::ALL.len(),
    ObjectClass::ALL.len(),
];

/// Flags used above the base: classifications, per-manual markers and the highlight.
fn flag_span(cardinalities: [usize; 3]) -> u64 {
    let [manual, filter, classifier] = cardinalities.map(|c| c as u64);
    manual
        .saturating_mul(filter)
        .saturating_mul(classifier)
        .saturating_add(manual)
        .saturating_add(1)
}

/// Clamp a base into `1..=Flag::MAX - span`.
fn fit_base(base: Flag, span: u64) -> Flag {
    let highest = u64::from(Flag::MAX).saturating_sub(span).max(1);
    let fitted = u64::from(base).clamp(1, highest);
    if fitted != u64::from(base) {
        log::warn!("Flag base {} leaves no room for {} flags, using {}", base, span, fitted);
    }
    Flag::try_from(fitted).unwrap_or(1)
}

/// Bidirectional mapping between class triples and flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassificationCodec {
    base: Flag,
    cardinalities: [usize; 3],
}

impl Default for ClassificationCodec {
    fn default() -> Self {
        Self::new(DEFAULT_FLAG_BASE)
    }
}

impl ClassificationCodec {
    /// Create a codec for the standard axis value sets.
    /// A base of zero is raised to one so flags never collide with background,
    /// and a base too close to `Flag::MAX` is lowered so every marker fits.
    pub fn new(base: Flag) -> Self {
        let cardinalities = STANDARD_CARDINALITIES;
        Self {
            base: fit_base(base, flag_span(cardinalities)),
            cardinalities,
        }
    }

    /// Create a codec with explicit axis cardinalities (manual, filter, classifier).
    pub fn with_cardinalities(base: Flag, cardinalities: [usize; 3]) -> Result<Self> {
        let cardinalities = cardinalities.map(|c| c.max(1));
        let span = flag_span(cardinalities);
        if span >= u64::from(Flag::MAX) {
            return Err(EngineError::FlagRangeOverflow(cardinalities));
        }
        Ok(Self {
            base: fit_base(base, span),
            cardinalities,
        })
    }

    /// Smallest classification flag.
    pub fn base(&self) -> Flag {
        self.base
    }

    /// Number of values accepted on an axis.
    pub fn cardinality(&self, axis: Axis) -> usize {
        self.cardinalities[axis.position()]
    }

    /// Number of distinct classification flags.
    pub fn classification_count(&self) -> usize {
        self.cardinalities.iter().product()
    }

    fn stride(&self, axis: Axis) -> usize {
        self.cardinalities[..axis.position()].iter().product()
    }

    fn check(&self, axis: Axis, index: usize) -> Result<()> {
        let cardinality = self.cardinality(axis);
        if index >= cardinality {
            return Err(EngineError::InvalidAxisValue {
                axis,
                index,
                cardinality,
            });
        }
        Ok(())
    }

    /// Encode a value-index triple.
    pub fn encode(&self, manual: usize, filter: usize, classifier: usize) -> Result<Flag> {
        self.encode_indices([manual, filter, classifier])
    }

    /// Encode value indices given in codec order.
    pub fn encode_indices(&self, indices: [usize; 3]) -> Result<Flag> {
        let mut offset = 0;
        for axis in Axis::ALL {
            let index = indices[axis.position()];
            self.check(axis, index)?;
            offset += index * self.stride(axis);
        }
        Ok(self.base + offset as Flag)
    }

    /// Encode a typed class triple.
    pub fn encode_triple(&self, triple: &ClassTriple) -> Result<Flag> {
        self.encode_indices(triple.indices())
    }

    fn offset(&self, flag: Flag) -> Result<usize> {
        if !self.is_classification_flag(flag) {
            return Err(EngineError::InvalidFlag(flag));
        }
        Ok((flag - self.base) as usize)
    }

    /// Decode the value index of one axis.
    pub fn decode(&self, flag: Flag, axis: Axis) -> Result<usize> {
        let offset = self.offset(flag)?;
        Ok(offset / self.stride(axis) % self.cardinality(axis))
    }

    /// Decode all value indices in codec order.
    pub fn decode_indices(&self, flag: Flag) -> Result<[usize; 3]> {
        let offset = self.offset(flag)?;
        Ok(Axis::ALL.map(|axis| offset / self.stride(axis) % self.cardinality(axis)))
    }

    /// Decode a typed class triple.
    pub fn decode_triple(&self, flag: Flag) -> Result<ClassTriple> {
        let indices = self.decode_indices(flag)?;
        ClassTriple::from_indices(indices).ok_or(EngineError::InvalidFlag(flag))
    }

    /// Replace the value of one axis, leaving the others untouched.
    pub fn with_axis(&self, flag: Flag, axis: Axis, index: usize) -> Result<Flag> {
        self.check(axis, index)?;
        let mut indices = self.decode_indices(flag)?;
        indices[axis.position()] = index;
        self.encode_indices(indices)
    }

    /// Check if a flag encodes a classification triple.
    pub fn is_classification_flag(&self, flag: Flag) -> bool {
        flag >= self.base && ((flag - self.base) as usize) < self.classification_count()
    }

    fn marker_base(&self) -> Flag {
        self.base + self.classification_count() as Flag
    }

    /// Selection marker showing the given manual value.
    pub fn selected_flag(&self, manual: usize) -> Result<Flag> {
        self.check(Axis::Manual, manual)?;
        Ok(self.marker_base() + manual as Flag)
    }

    /// Uniform selection marker, independent of classification.
    pub fn highlight_flag(&self) -> Flag {
        self.marker_base() + self.cardinality(Axis::Manual) as Flag
    }

    /// Check if a flag is one of the selection markers.
    pub fn is_selected_flag(&self, flag: Flag) -> bool {
        flag >= self.marker_base() && flag <= self.highlight_flag()
    }

    /// Manual value shown by a class-specific selection marker.
    pub fn selected_manual(&self, flag: Flag) -> Option<usize> {
        if flag >= self.marker_base() && flag < self.highlight_flag() {
            Some((flag - self.marker_base()) as usize)
        } else {
            None
        }
    }
}
