//! Engine facade wiring every component for one owner thread.
//!
//! The engine owns the codec, the loaded image and the selection, filter and
//! classifier state. Operations that need an image fail with
//! [`EngineError::NoImageLoaded`] when none is loaded, except the ones that
//! are harmless no-ops without one (background click, reclassify).

use std::sync::Arc;

use serde::Serialize;

use crate::classifier::{ClassifierReport, ClassifierSynchronizer};
use crate::codec::ClassificationCodec;
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::filter::{FilterReport, FilterSynchronizer};
use crate::image::ImageState;
use crate::manual_log::{ManualClassLog, ManualLog};
use crate::model::{Attribute, BoundingBox3, ManualClass, ObjectNumber, Voxel};
use crate::oracle::{CentroidOracle, ClassifierOracle};
use crate::sampling::{self, Sampler};
use crate::selection::{ReclassifyOutcome, SelectMode, SelectedObject, SelectionController};
use crate::stats::ClassificationStats;
use crate::store::{TableStore, VoxelStore};

/// Outcome of loading an image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// Objects painted from their records
    pub objects: usize,
    /// Filter carried over from the previous image
    pub filter: Option<FilterReport>,
    /// Active oracle re-applied to the new image
    pub classifier: Option<ClassifierReport>,
}

/// Classification engine for one interactive session.
pub struct Engine {
    config: EngineConfig,
    codec: ClassificationCodec,
    image: Option<ImageState>,
    selection: SelectionController,
    filter: FilterSynchronizer,
    classifier: ClassifierSynchronizer,
    manual_log: Box<dyn ManualLog>,
    /// Bounding box of the last presented object
    view: Option<BoundingBox3>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("codec", &self.codec)
            .field("image", &self.image)
            .field("selection", &self.selection)
            .field("filter", &self.filter)
            .field("classifier", &self.classifier)
            .field("view", &self.view)
            .finish()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Engine {
    /// Create an engine with an in-memory manual log.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_manual_log(config, Box::new(ManualClassLog::new()))
    }

    /// Create an engine reporting manual classifications to `manual_log`.
    pub fn with_manual_log(config: EngineConfig, manual_log: Box<dyn ManualLog>) -> Self {
        let codec = ClassificationCodec::new(config.flag_base);
        let classifier = ClassifierSynchronizer::new(
            config.classifier.features.clone(),
            config.filter.gates_classifier,
        );
        Self {
            config,
            codec,
            image: None,
            selection: SelectionController::new(),
            filter: FilterSynchronizer::new(),
            classifier,
            manual_log,
            view: None,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn codec(&self) -> &ClassificationCodec {
        &self.codec
    }

    pub fn image(&self) -> Option<&ImageState> {
        self.image.as_ref()
    }

    pub fn filter(&self) -> &FilterSynchronizer {
        &self.filter
    }

    pub fn classifier(&self) -> &ClassifierSynchronizer {
        &self.classifier
    }

    pub fn manual_log(&self) -> &dyn ManualLog {
        self.manual_log.as_ref()
    }

    /// Statistics of the loaded image.
    pub fn stats(&self) -> Option<&ClassificationStats> {
        self.image.as_ref().map(ImageState::stats)
    }

    /// Get the selected object, if any.
    pub fn selected(&self) -> Option<&SelectedObject> {
        self.selection.selected()
    }

    /// Bounding box of the last presented object.
    pub fn view(&self) -> Option<BoundingBox3> {
        self.view
    }

    fn image_ref(&self) -> Result<&ImageState> {
        self.image.as_ref().ok_or(EngineError::NoImageLoaded)
    }

    // ========================================================================
    // Image switching
    // ========================================================================

    /// Replace the loaded image.
    ///
    /// Every object is painted from its record, the active filter is carried
    /// over against the new value range, and an attached oracle is re-applied.
    pub fn load_image(
        &mut self,
        key: impl Into<String>,
        voxels: Box<dyn VoxelStore>,
        table: Box<dyn TableStore>,
    ) -> Result<LoadReport> {
        self.select_background_click()?;
        let carried = self.filter.carried_filter(table.as_ref());

        let mut image = ImageState::new(key, voxels, table);
        let objects = image.paint_all(&self.codec)?;
        log::info!(
            "Loaded image '{}' with {} objects ({} manually classified)",
            image.key(),
            objects,
            image.stats().classified()
        );

        self.selection = SelectionController::new();
        self.filter.reset();
        self.view = None;
        let image = self.image.insert(image);

        let filter = match carried {
            Some(active) => {
                log::info!(
                    "Carrying filter {} [{}, {}] to '{}'",
                    active.attribute,
                    active.min,
                    active.max,
                    image.key()
                );
                Some(self.filter.set_filter(
                    image,
                    &self.codec,
                    &mut self.selection,
                    &self.classifier,
                    active.attribute,
                    active.min,
                    active.max,
                )?)
            }
            None => None,
        };

        let classifier = match self.classifier.oracle() {
            Some(_) => Some(
                self.classifier
                    .reapply(image, &self.codec, &mut self.selection)?,
            ),
            None => None,
        };

        Ok(LoadReport {
            objects,
            filter,
            classifier,
        })
    }

    // ========================================================================
    // Selection
    // ========================================================================

    /// Select the object covering `voxel`. Background clears the selection.
    pub fn select_object(&mut self, voxel: Voxel, mode: SelectMode) -> Result<Option<ObjectNumber>> {
        let image = self.image.as_mut().ok_or(EngineError::NoImageLoaded)?;
        self.selection.select_object(image, &self.codec, voxel, mode)
    }

    /// Clear the selection, restoring the object's classified flag.
    pub fn select_background_click(&mut self) -> Result<Option<ObjectNumber>> {
        match self.image.as_mut() {
            Some(image) => self.selection.select_background_click(image),
            None => Ok(None),
        }
    }

    /// Change the manual class of the selected object.
    pub fn reclassify(&mut self, class: ManualClass) -> Result<ReclassifyOutcome> {
        let Some(image) = self.image.as_mut() else {
            return Ok(ReclassifyOutcome::NothingSelected);
        };
        self.selection
            .reclassify(image, &self.codec, self.manual_log.as_mut(), class)
    }

    /// Select an object by number and focus the view on it.
    pub fn present(&mut self, object: ObjectNumber) -> Result<()> {
        let image = self.image.as_mut().ok_or(EngineError::NoImageLoaded)?;
        let first = image.first_voxel(object)?;
        self.selection
            .select_object(image, &self.codec, first, SelectMode::RespectClass)?;
        self.view = image.voxels().bounding_box(first);
        log::debug!("Presented object {} (view {:?})", object, self.view);
        Ok(())
    }

    /// Verify that an object's voxel flag decodes to its record.
    pub fn check_consistency(&self, object: ObjectNumber) -> Result<()> {
        self.image_ref()?.check_consistency(&self.codec, object)
    }

    // ========================================================================
    // Filter
    // ========================================================================

    /// Filter on `attribute` with the accepted range `[min, max]`.
    pub fn set_filter(&mut self, attribute: Attribute, min: f64, max: f64) -> Result<FilterReport> {
        let image = self.image.as_mut().ok_or(EngineError::NoImageLoaded)?;
        self.filter.set_filter(
            image,
            &self.codec,
            &mut self.selection,
            &self.classifier,
            attribute,
            min,
            max,
        )
    }

    /// Let every object pass.
    pub fn clear_filter(&mut self) -> Result<FilterReport> {
        let image = self.image.as_mut().ok_or(EngineError::NoImageLoaded)?;
        self.filter
            .clear_filter(image, &self.codec, &mut self.selection, &self.classifier)
    }

    // ========================================================================
    // Classifier
    // ========================================================================

    /// Train the built-in oracle on the loaded image's manual classes.
    pub fn train_centroid_oracle(&self) -> Result<CentroidOracle> {
        CentroidOracle::train(self.image_ref()?.table(), self.classifier.features())
    }

    /// Attach an oracle and classify every object with it.
    pub fn apply_classifier(
        &mut self,
        oracle: Arc<dyn ClassifierOracle>,
        filter_gates: bool,
    ) -> Result<ClassifierReport> {
        let image = self.image.as_mut().ok_or(EngineError::NoImageLoaded)?;
        self.classifier
            .apply_classifier(image, &self.codec, &mut self.selection, oracle, filter_gates)
    }

    /// Change whether failing the filter forces non-feature.
    pub fn set_filter_gates(&mut self, filter_gates: bool) -> Result<ClassifierReport> {
        let image = self.image.as_mut().ok_or(EngineError::NoImageLoaded)?;
        self.classifier
            .set_filter_gates(image, &self.codec, &mut self.selection, filter_gates)
    }

    /// Detach the oracle and reset every object to the baseline class.
    pub fn remove_classifier(&mut self) -> Result<ClassifierReport> {
        let image = self.image.as_mut().ok_or(EngineError::NoImageLoaded)?;
        self.classifier
            .remove_classifier(image, &self.codec, &mut self.selection)
    }

    // ========================================================================
    // Sampling
    // ========================================================================

    fn sampler(&self) -> Result<Sampler<'_>> {
        let image = self.image_ref()?;
        let oracle = self
            .classifier
            .oracle()
            .ok_or_else(|| EngineError::oracle_unavailable("no classifier attached"))?;
        Ok(Sampler::new(
            image.table(),
            oracle.as_ref(),
            self.classifier.features(),
            self.config.sampling.target_class,
        ))
    }

    /// Up to `n` unclassified objects with target probability in `[low, high]`.
    pub fn sample_uniform(
        &self,
        n: usize,
        low: f64,
        high: f64,
        seed: u64,
    ) -> Result<Vec<ObjectNumber>> {
        self.sampler()?.uniform(n, low, high, seed)
    }

    /// One object per equal sub-interval of `[low, high]`.
    pub fn sample_stratified_linear(
        &self,
        divisions: usize,
        low: f64,
        high: f64,
        seed: u64,
    ) -> Result<Vec<ObjectNumber>> {
        self.sampler()?.stratified_linear(divisions, low, high, seed)
    }

    /// `weights[i]` objects from the i-th equal sub-interval of `[low, high]`.
    pub fn sample_stratified_weighted(
        &self,
        weights: &[u32],
        low: f64,
        high: f64,
        seed: u64,
    ) -> Result<Vec<ObjectNumber>> {
        self.sampler()?.stratified_weighted(weights, low, high, seed)
    }

    /// Objects with `attribute` in `[min, max]`, ascending. No oracle needed.
    pub fn sample_by_attribute_range(
        &self,
        attribute: Attribute,
        min: f64,
        max: f64,
        include_all_classes: bool,
    ) -> Result<Vec<ObjectNumber>> {
        sampling::by_attribute_range(
            self.image_ref()?.table(),
            attribute,
            min,
            max,
            include_all_classes,
        )
    }
}
