//! Classifier oracle trait and a built-in nearest-centroid model.

use crate::error::{EngineError, Result};
use crate::model::{Attribute, ClassifierClass, ManualClass, ObjectClass};
use crate::store::TableStore;

/// Predicted class with a probability distribution over all class values.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Most probable class
    pub class: ClassifierClass,
    /// Probabilities indexed by `ObjectClass::index`
    pub probabilities: [f64; 4],
}

impl Prediction {
    /// Create a prediction from a distribution, picking the most probable class.
    pub fn from_probabilities(probabilities: [f64; 4]) -> Self {
        let mut best = 0;
        for (i, p) in probabilities.iter().enumerate() {
            if *p > probabilities[best] {
                best = i;
            }
        }
        Self {
            class: ObjectClass::from_index(best).unwrap_or_default(),
            probabilities,
        }
    }

    /// A prediction with all probability on one class.
    pub fn certain(class: ClassifierClass) -> Self {
        let mut probabilities = [0.0; 4];
        probabilities[class.index()] = 1.0;
        Self {
            class,
            probabilities,
        }
    }

    /// Probability of one class.
    pub fn probability(&self, class: ClassifierClass) -> f64 {
        self.probabilities[class.index()]
    }
}

/// External classifier consulted for every object's feature vector.
pub trait ClassifierOracle: Send + Sync {
    /// Get the oracle name
    fn name(&self) -> &str;

    /// Whether the oracle is trained or loaded and can answer queries
    fn is_ready(&self) -> bool {
        true
    }

    /// Classify one feature vector
    fn classify(&self, features: &[f64]) -> Result<Prediction>;
}

// ============================================================================
// Nearest-centroid oracle
// ============================================================================

/// Heuristic model trained on the manually classified rows of a table.
///
/// Features are z-scored with the training mean and deviation; the
/// distribution is a softmax over negative squared distances to each class
/// centroid.
#[derive(Debug, Clone)]
pub struct CentroidOracle {
    mean: Vec<f64>,
    scale: Vec<f64>,
    centroids: Vec<(ManualClass, Vec<f64>)>,
}

impl CentroidOracle {
    /// Train from every manually classified object.
    /// Needs at least two distinct manual classes.
    pub fn train(table: &dyn TableStore, features: &[Attribute]) -> Result<Self> {
        if features.is_empty() {
            return Err(EngineError::oracle_unavailable("no features configured"));
        }

        let rows: Vec<(ManualClass, Vec<f64>)> = table
            .object_numbers()
            .filter_map(|object| {
                let manual = table.classes(object)?.manual;
                if manual == ManualClass::Unclassified {
                    return None;
                }
                Some((manual, table.feature_vector(object, features)?))
            })
            .collect();

        let mut classes: Vec<ManualClass> = rows.iter().map(|(c, _)| *c).collect();
        classes.sort_by_key(|c| c.index());
        classes.dedup();
        if classes.len() < 2 {
            return Err(EngineError::oracle_unavailable(format!(
                "training needs two manual classes, found {}",
                classes.len()
            )));
        }

        let dims = features.len();
        let n = rows.len() as f64;
        let mut mean = vec![0.0; dims];
        for (_, values) in &rows {
            for (m, v) in mean.iter_mut().zip(values) {
                *m += v / n;
            }
        }
        let mut scale = vec![0.0; dims];
        for (_, values) in &rows {
            for ((s, v), m) in scale.iter_mut().zip(values).zip(&mean) {
                *s += (v - m).powi(2) / n;
            }
        }
        for s in &mut scale {
            *s = if *s > f64::EPSILON { s.sqrt() } else { 1.0 };
        }

        let centroids = classes
            .into_iter()
            .map(|class| {
                let members: Vec<&Vec<f64>> = rows
                    .iter()
                    .filter(|(c, _)| *c == class)
                    .map(|(_, v)| v)
                    .collect();
                let count = members.len() as f64;
                let mut centroid = vec![0.0; dims];
                for values in members {
                    for (i, v) in values.iter().enumerate() {
                        centroid[i] += (v - mean[i]) / scale[i] / count;
                    }
                }
                (class, centroid)
            })
            .collect::<Vec<_>>();

        log::info!(
            "Trained centroid oracle on {} objects, {} classes, {} features",
            rows.len(),
            centroids.len(),
            dims
        );

        Ok(Self {
            mean,
            scale,
            centroids,
        })
    }

    /// Classes the oracle can predict.
    pub fn classes(&self) -> Vec<ManualClass> {
        self.centroids.iter().map(|(c, _)| *c).collect()
    }
}

impl ClassifierOracle for CentroidOracle {
    fn name(&self) -> &str {
        "nearest-centroid"
    }

    fn classify(&self, features: &[f64]) -> Result<Prediction> {
        if features.len() != self.mean.len() {
            return Err(EngineError::oracle_unavailable(format!(
                "expected {} features, got {}",
                self.mean.len(),
                features.len()
            )));
        }
        if features.iter().any(|v| !v.is_finite()) {
            return Err(EngineError::oracle_unavailable("non-finite feature value"));
        }

        let distances: Vec<(ManualClass, f64)> = self
            .centroids
            .iter()
            .map(|(class, centroid)| {
                let d: f64 = features
                    .iter()
                    .zip(&self.mean)
                    .zip(&self.scale)
                    .zip(centroid)
                    .map(|(((v, m), s), c)| ((v - m) / s - c).powi(2))
                    .sum();
                (*class, d)
            })
            .collect();

        let nearest = distances
            .iter()
            .map(|(_, d)| *d)
            .fold(f64::INFINITY, f64::min);
        let mut probabilities = [0.0; 4];
        let mut total = 0.0;
        for (class, d) in &distances {
            let weight = (nearest - d).exp();
            probabilities[class.index()] = weight;
            total += weight;
        }
        for p in &mut probabilities {
            *p /= total;
        }

        Ok(Prediction::from_probabilities(probabilities))
    }
}
