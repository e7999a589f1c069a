//! Scenario tests across engine components.
//!
//! These tests drive selection, filtering, classification, sampling and
//! traversal over small synthetic volumes and check that voxel flags and
//! table records stay in step.

mod sampling_tests;
mod selection_tests;

use crate::codec::ClassificationCodec;
use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::error::{EngineError, Result};
use crate::image::ImageState;
use crate::model::{Attribute, ObjectClass, ObjectNumber, Voxel};
use crate::oracle::{ClassifierOracle, Prediction};
use crate::synthetic::{BoxObject, SyntheticVolume};

/// Volumes used by most scenarios; object `i + 1` has volume `LENGTHS[i]`.
const LENGTHS: [usize; 9] = [5, 10, 12, 15, 19, 20, 30, 50, 60];

/// One line object per length, two rows apart so they never touch.
fn line_volume(lengths: &[usize]) -> SyntheticVolume {
    let longest = lengths.iter().copied().max().unwrap_or(1);
    let boxes: Vec<BoxObject> = lengths
        .iter()
        .enumerate()
        .map(|(i, len)| BoxObject::line(line_origin(i as ObjectNumber + 1), *len, 100.0))
        .collect();
    SyntheticVolume::from_boxes((longest + 1, 2 * lengths.len() + 1, 1), &boxes)
}

/// First voxel of line object `object`.
fn line_origin(object: ObjectNumber) -> Voxel {
    Voxel::new(0, 2 * (object as usize - 1), 0)
}

/// Configuration with volume as the only classifier feature.
fn test_config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.classifier.features = vec![Attribute::Volume];
    config
}

/// Engine with a line volume loaded.
fn loaded_engine(lengths: &[usize]) -> Engine {
    let synthetic = line_volume(lengths);
    let mut engine = Engine::new(test_config());
    engine
        .load_image("lines", Box::new(synthetic.voxels), Box::new(synthetic.table))
        .expect("Failed to load image");
    engine
}

/// Painted image for tests that drive components directly.
fn painted_image(lengths: &[usize], codec: &ClassificationCodec) -> ImageState {
    let synthetic = line_volume(lengths);
    let mut image = ImageState::new("lines", Box::new(synthetic.voxels), Box::new(synthetic.table));
    image.paint_all(codec).expect("Failed to paint image");
    image
}

/// Every object's flag decodes to its record and nothing shows a marker.
fn assert_all_consistent(image: &ImageState, codec: &ClassificationCodec) {
    for object in image.table().object_numbers() {
        image
            .check_consistency(codec, object)
            .unwrap_or_else(|e| panic!("object {} inconsistent: {}", object, e));
    }
}

/// Oracle answering from the first feature: P(feature) = value / 100.
struct StubOracle {
    ready: bool,
    fail_on: Vec<f64>,
}

impl StubOracle {
    fn new() -> Self {
        Self {
            ready: true,
            fail_on: Vec::new(),
        }
    }

    fn untrained() -> Self {
        Self {
            ready: false,
            fail_on: Vec::new(),
        }
    }

    fn failing_on(values: &[f64]) -> Self {
        Self {
            ready: true,
            fail_on: values.to_vec(),
        }
    }

    fn probability(value: f64) -> f64 {
        (value / 100.0).clamp(0.0, 1.0)
    }
}

impl ClassifierOracle for StubOracle {
    fn name(&self) -> &str {
        "stub"
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn classify(&self, features: &[f64]) -> Result<Prediction> {
        let value = *features
            .first()
            .ok_or_else(|| EngineError::oracle_unavailable("empty feature vector"))?;
        if self.fail_on.contains(&value) {
            return Err(EngineError::oracle_unavailable(format!("cannot score {}", value)));
        }
        let p = Self::probability(value);
        let mut probabilities = [0.0; 4];
        probabilities[ObjectClass::Feature.index()] = p;
        probabilities[ObjectClass::NonFeature.index()] = 1.0 - p;
        Ok(Prediction::from_probabilities(probabilities))
    }
}
