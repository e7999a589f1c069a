//! Keeps every object's classifier axis in line with the active oracle.

use std::sync::Arc;

use serde::Serialize;

use crate::codec::ClassificationCodec;
use crate::error::{EngineError, Result};
use crate::image::ImageState;
use crate::model::{Attribute, Axis, ClassifierClass, FilterClass, ObjectClass, ObjectNumber};
use crate::oracle::ClassifierOracle;
use crate::selection::SelectionController;

/// Classifier value assumed for every object while no oracle is attached.
pub const BASELINE_CLASS: ClassifierClass = ObjectClass::Feature;

/// Outcome of a bulk classifier synchronization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClassifierReport {
    /// Objects whose classifier axis changed
    pub updated: usize,
    /// Objects left untouched because the oracle could not answer
    pub skipped: usize,
}

/// Outcome for a single object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectSync {
    Updated,
    Unchanged,
    Skipped,
}

/// Owner of the active oracle and the "filter gates classifier" policy.
pub struct ClassifierSynchronizer {
    oracle: Option<Arc<dyn ClassifierOracle>>,
    filter_gates: bool,
    features: Vec<Attribute>,
}

impl std::fmt::Debug for ClassifierSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassifierSynchronizer")
            .field("oracle", &self.oracle.as_ref().map(|o| o.name().to_string()))
            .field("filter_gates", &self.filter_gates)
            .field("features", &self.features)
            .finish()
    }
}

impl Default for ClassifierSynchronizer {
    fn default() -> Self {
        Self::new(Attribute::ALL.to_vec(), false)
    }
}

impl ClassifierSynchronizer {
    /// Create a synchronizer without an oracle.
    pub fn new(features: Vec<Attribute>, filter_gates: bool) -> Self {
        Self {
            oracle: None,
            filter_gates,
            features,
        }
    }

    /// Get the active oracle.
    pub fn oracle(&self) -> Option<&Arc<dyn ClassifierOracle>> {
        self.oracle.as_ref()
    }

    /// Whether objects failing the filter are forced to non-feature.
    pub fn filter_gates(&self) -> bool {
        self.filter_gates
    }

    /// Attributes fed to the oracle, in order.
    pub fn features(&self) -> &[Attribute] {
        &self.features
    }

    /// Value the classifier axis should hold. None if the oracle failed.
    pub fn target_class(
        &self,
        image: &ImageState,
        object: ObjectNumber,
    ) -> Result<Option<ClassifierClass>> {
        let classes = image.classes(object)?;
        if self.filter_gates && classes.filter == FilterClass::NotPassed {
            return Ok(Some(ObjectClass::NonFeature));
        }
        let Some(oracle) = &self.oracle else {
            return Ok(Some(BASELINE_CLASS));
        };
        let features = image
            .table()
            .feature_vector(object, &self.features)
            .ok_or(EngineError::UnknownObject(object))?;
        match oracle.classify(&features) {
            Ok(prediction) => Ok(Some(prediction.class)),
            Err(e) => {
                log::warn!("Oracle '{}' skipped object {}: {}", oracle.name(), object, e);
                Ok(None)
            }
        }
    }

    /// Bring one object's classifier axis in line, unselecting it first if needed.
    pub fn refresh_object(
        &self,
        image: &mut ImageState,
        codec: &ClassificationCodec,
        selection: &mut SelectionController,
        object: ObjectNumber,
    ) -> Result<ObjectSync> {
        let Some(class) = self.target_class(image, object)? else {
            return Ok(ObjectSync::Skipped);
        };
        if image.classes(object)?.classifier == class {
            return Ok(ObjectSync::Unchanged);
        }
        selection.release(image, object)?;
        image.set_axis(codec, object, Axis::Classifier, class.index())?;
        Ok(ObjectSync::Updated)
    }

    fn sync_all(
        &self,
        image: &mut ImageState,
        codec: &ClassificationCodec,
        selection: &mut SelectionController,
    ) -> Result<ClassifierReport> {
        let mut report = ClassifierReport::default();
        for object in image.table().object_numbers() {
            match self.refresh_object(image, codec, selection, object)? {
                ObjectSync::Updated => report.updated += 1,
                ObjectSync::Unchanged => {}
                ObjectSync::Skipped => report.skipped += 1,
            }
        }
        image.repaint();
        Ok(report)
    }

    /// Attach an oracle and classify every object with it.
    pub fn apply_classifier(
        &mut self,
        image: &mut ImageState,
        codec: &ClassificationCodec,
        selection: &mut SelectionController,
        oracle: Arc<dyn ClassifierOracle>,
        filter_gates: bool,
    ) -> Result<ClassifierReport> {
        if !oracle.is_ready() {
            return Err(EngineError::oracle_unavailable(format!(
                "'{}' is not trained",
                oracle.name()
            )));
        }
        log::info!(
            "Applying classifier '{}' to {} objects (filter gates: {})",
            oracle.name(),
            image.object_count(),
            filter_gates
        );
        self.oracle = Some(oracle);
        self.filter_gates = filter_gates;

        let report = self.sync_all(image, codec, selection)?;
        if report.skipped > 0 {
            log::warn!("Classifier skipped {} objects", report.skipped);
        }
        Ok(report)
    }

    /// Re-run the active oracle (or baseline) over every object.
    pub fn reapply(
        &self,
        image: &mut ImageState,
        codec: &ClassificationCodec,
        selection: &mut SelectionController,
    ) -> Result<ClassifierReport> {
        self.sync_all(image, codec, selection)
    }

    /// Change the gating policy and resynchronize.
    pub fn set_filter_gates(
        &mut self,
        image: &mut ImageState,
        codec: &ClassificationCodec,
        selection: &mut SelectionController,
        filter_gates: bool,
    ) -> Result<ClassifierReport> {
        self.filter_gates = filter_gates;
        self.sync_all(image, codec, selection)
    }

    /// Detach the oracle and set every object to the baseline class.
    pub fn remove_classifier(
        &mut self,
        image: &mut ImageState,
        codec: &ClassificationCodec,
        selection: &mut SelectionController,
    ) -> Result<ClassifierReport> {
        if let Some(oracle) = self.oracle.take() {
            log::info!("Removed classifier '{}'", oracle.name());
        }
        self.filter_gates = false;
        self.sync_all(image, codec, selection)
    }
}
