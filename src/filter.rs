//! Keeps every object's filter axis in line with one attribute range.
//!
//! The first time an attribute is filtered on, the objects are sorted by that
//! attribute and every object is examined. Later bound changes on the same
//! attribute binary-search the sorted order and only visit objects in the
//! symmetric difference of the old and new accepted ranges.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::classifier::{ClassifierSynchronizer, ObjectSync};
use crate::codec::ClassificationCodec;
use crate::error::{EngineError, Result};
use crate::image::ImageState;
use crate::model::{Attribute, Axis, FilterClass, ObjectNumber};
use crate::selection::SelectionController;
use crate::store::TableStore;

/// An attribute range; objects inside pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActiveFilter {
    pub attribute: Attribute,
    pub min: f64,
    pub max: f64,
}

impl ActiveFilter {
    pub fn new(attribute: Attribute, min: f64, max: f64) -> Self {
        Self {
            attribute,
            min,
            max,
        }
    }

    /// Check if a value lies in `[min, max]`.
    pub fn accepts(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }
}

/// Outcome of a filter change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterReport {
    /// Every object was examined
    pub full_rescan: bool,
    /// Objects examined
    pub examined: usize,
    /// Objects whose filter axis changed, in visiting order
    pub touched: Vec<ObjectNumber>,
    /// Gated classifier updates the oracle could not answer
    pub classifier_skipped: usize,
}

/// Owner of the active attribute range.
#[derive(Debug, Clone, Default)]
pub struct FilterSynchronizer {
    active: Option<ActiveFilter>,
    /// (value, object) sorted ascending for the active attribute
    order: Vec<(f64, ObjectNumber)>,
    /// Smallest and largest value of the active attribute in this image
    observed: Option<(f64, f64)>,
    min_reached: bool,
    max_reached: bool,
}

/// Positions in `order` whose value lies in `[min, max]`.
fn accepted_range(order: &[(f64, ObjectNumber)], min: f64, max: f64) -> Range<usize> {
    let start = order.partition_point(|(v, _)| *v < min);
    let end = order.partition_point(|(v, _)| *v <= max);
    start..end.max(start)
}

/// Positions in `a` but not in `b`, as at most two ranges.
fn difference(a: &Range<usize>, b: &Range<usize>) -> [Range<usize>; 2] {
    [
        a.start..a.end.min(b.start),
        a.start.max(b.end)..a.end,
    ]
}

impl FilterSynchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the active filter.
    pub fn active(&self) -> Option<&ActiveFilter> {
        self.active.as_ref()
    }

    /// Lower bound was at or below the smallest observed value.
    pub fn min_reached(&self) -> bool {
        self.min_reached
    }

    /// Upper bound was at or above the largest observed value.
    pub fn max_reached(&self) -> bool {
        self.max_reached
    }

    /// Smallest and largest value of the active attribute.
    pub fn observed(&self) -> Option<(f64, f64)> {
        self.observed
    }

    /// Forget all state (used when switching images).
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Drop all state after a failed update so the next filter rescans.
    fn abandon(&mut self, image: &mut ImageState, object: ObjectNumber, error: &EngineError) {
        log::warn!(
            "Filter update stopped at object {}: {}; next filter will rescan",
            object,
            error
        );
        self.reset();
        image.repaint();
    }

    fn update_object(
        image: &mut ImageState,
        codec: &ClassificationCodec,
        selection: &mut SelectionController,
        classifier: &ClassifierSynchronizer,
        object: ObjectNumber,
        want: FilterClass,
        report: &mut FilterReport,
    ) -> Result<()> {
        report.examined += 1;
        if image.classes(object)?.filter == want {
            return Ok(());
        }
        selection.release(image, object)?;
        image.set_axis(codec, object, Axis::Filter, want.index())?;
        report.touched.push(object);

        if classifier.filter_gates()
            && classifier.refresh_object(image, codec, selection, object)? == ObjectSync::Skipped
        {
            report.classifier_skipped += 1;
        }
        Ok(())
    }

    /// Filter on `attribute` with the accepted range `[min, max]`.
    #[expect(clippy::too_many_arguments)]
    pub fn set_filter(
        &mut self,
        image: &mut ImageState,
        codec: &ClassificationCodec,
        selection: &mut SelectionController,
        classifier: &ClassifierSynchronizer,
        attribute: Attribute,
        min: f64,
        max: f64,
    ) -> Result<FilterReport> {
        if min.is_nan() || max.is_nan() || min > max {
            return Err(EngineError::InvalidRange { min, max });
        }
        let filter = ActiveFilter::new(attribute, min, max);
        let mut report = FilterReport::default();

        // A new order is only committed once every object was updated.
        let (rescanned, candidates): (Option<Vec<(f64, ObjectNumber)>>, Vec<(f64, ObjectNumber)>) =
            match self.active {
                Some(previous) if previous.attribute == attribute => {
                    let old = accepted_range(&self.order, previous.min, previous.max);
                    let new = accepted_range(&self.order, min, max);
                    let candidates = difference(&old, &new)
                        .into_iter()
                        .chain(difference(&new, &old))
                        .flat_map(|range| self.order[range].iter().copied())
                        .collect();
                    (None, candidates)
                }
                _ => {
                    report.full_rescan = true;
                    let order = image.table().sorted_by(attribute);
                    let candidates = order.clone();
                    (Some(order), candidates)
                }
            };

        for (value, object) in candidates {
            let want = FilterClass::from_passed(filter.accepts(value));
            if let Err(e) =
                Self::update_object(image, codec, selection, classifier, object, want, &mut report)
            {
                self.abandon(image, object, &e);
                return Err(e);
            }
        }

        if let Some(order) = rescanned {
            self.observed = order.first().zip(order.last()).map(|(lo, hi)| (lo.0, hi.0));
            self.order = order;
        }
        self.active = Some(filter);
        self.min_reached = self.observed.is_none_or(|(lo, _)| min <= lo);
        self.max_reached = self.observed.is_none_or(|(_, hi)| max >= hi);
        image.repaint();

        log::info!(
            "Filter {} in [{}, {}]: examined {}, changed {}{}",
            attribute,
            min,
            max,
            report.examined,
            report.touched.len(),
            if report.full_rescan { " (full rescan)" } else { "" }
        );
        Ok(report)
    }

    /// Let every object pass and drop the active attribute.
    pub fn clear_filter(
        &mut self,
        image: &mut ImageState,
        codec: &ClassificationCodec,
        selection: &mut SelectionController,
        classifier: &ClassifierSynchronizer,
    ) -> Result<FilterReport> {
        let mut report = FilterReport {
            full_rescan: true,
            ..Default::default()
        };
        for object in image.table().object_numbers() {
            if let Err(e) = Self::update_object(
                image,
                codec,
                selection,
                classifier,
                object,
                FilterClass::Passed,
                &mut report,
            ) {
                self.abandon(image, object, &e);
                return Err(e);
            }
        }
        self.reset();
        image.repaint();
        log::info!("Filter cleared: {} objects restored", report.touched.len());
        Ok(report)
    }

    /// Bounds to reapply on another image's table.
    ///
    /// A bound that sat at the previous image's observed extreme moves to the
    /// new image's extreme instead of keeping its old number, so objects
    /// beyond the old extreme are not dropped. Other bounds carry over as is.
    pub fn carried_filter(&self, table: &dyn TableStore) -> Option<ActiveFilter> {
        let active = self.active?;
        let order = table.sorted_by(active.attribute);
        let (lo, hi) = (order.first()?.0, order.last()?.0);

        let min = if self.min_reached { lo } else { active.min };
        let max = if self.max_reached { hi } else { active.max };
        Some(ActiveFilter::new(active.attribute, min, max.max(min)))
    }
}
