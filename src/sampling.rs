//! Candidate sampling for manual review.
//!
//! The randomized samplers draw from unclassified objects whose oracle
//! probability for a target class lies in a closed interval. The attribute
//! sampler is deterministic and needs no oracle.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::error::{EngineError, Result};
use crate::model::{Attribute, ClassifierClass, ManualClass, ObjectNumber};
use crate::oracle::ClassifierOracle;
use crate::store::TableStore;

/// Oracle-driven sampler over one table.
pub struct Sampler<'a> {
    table: &'a dyn TableStore,
    oracle: &'a dyn ClassifierOracle,
    features: &'a [Attribute],
    target: ClassifierClass,
}

fn check_interval(low: f64, high: f64) -> Result<()> {
    if low.is_nan() || high.is_nan() || low > high {
        return Err(EngineError::invalid_sampling(format!(
            "probability interval [{}, {}] is empty",
            low, high
        )));
    }
    Ok(())
}

/// Sub-interval of `[low, high]` split in `divisions` that holds `p`.
/// The last sub-interval is closed on both ends.
fn division_of(p: f64, low: f64, high: f64, divisions: usize) -> usize {
    let width = (high - low) / divisions as f64;
    if width <= 0.0 {
        return 0;
    }
    (((p - low) / width).floor() as usize).min(divisions - 1)
}

impl<'a> Sampler<'a> {
    pub fn new(
        table: &'a dyn TableStore,
        oracle: &'a dyn ClassifierOracle,
        features: &'a [Attribute],
        target: ClassifierClass,
    ) -> Self {
        Self {
            table,
            oracle,
            features,
            target,
        }
    }

    /// Unclassified objects with their target probability inside `[low, high]`,
    /// in object order.
    pub fn candidates(&self, low: f64, high: f64) -> Vec<(f64, ObjectNumber)> {
        let mut skipped = 0;
        let candidates: Vec<(f64, ObjectNumber)> = self
            .table
            .object_numbers()
            .filter(|object| {
                self.table
                    .classes(*object)
                    .is_some_and(|c| c.manual == ManualClass::Unclassified)
            })
            .filter_map(|object| {
                let features = self.table.feature_vector(object, self.features)?;
                match self.oracle.classify(&features) {
                    Ok(prediction) => Some((prediction.probability(self.target), object)),
                    Err(e) => {
                        log::debug!("Sampling skipped object {}: {}", object, e);
                        skipped += 1;
                        None
                    }
                }
            })
            .filter(|(p, _)| low <= *p && *p <= high)
            .collect();

        if skipped > 0 {
            log::warn!(
                "Oracle '{}' could not score {} objects while sampling",
                self.oracle.name(),
                skipped
            );
        }
        candidates
    }

    /// Up to `n` candidates picked at random.
    pub fn uniform(&self, n: usize, low: f64, high: f64, seed: u64) -> Result<Vec<ObjectNumber>> {
        check_interval(low, high)?;
        let mut objects: Vec<ObjectNumber> =
            self.candidates(low, high).into_iter().map(|(_, o)| o).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        let (picked, _) = objects.partial_shuffle(&mut rng, n);
        let picked = picked.to_vec();
        log::info!(
            "Uniform sample: {} of {} requested in [{}, {}]",
            picked.len(),
            n,
            low,
            high
        );
        Ok(picked)
    }

    /// One candidate per equal sub-interval of `[low, high]`, skipping empty ones.
    pub fn stratified_linear(
        &self,
        divisions: usize,
        low: f64,
        high: f64,
        seed: u64,
    ) -> Result<Vec<ObjectNumber>> {
        self.stratified_weighted(&vec![1; divisions], low, high, seed)
    }

    /// `weights[i]` candidates from the i-th equal sub-interval of `[low, high]`.
    /// A sub-interval with fewer candidates gives what it has.
    pub fn stratified_weighted(
        &self,
        weights: &[u32],
        low: f64,
        high: f64,
        seed: u64,
    ) -> Result<Vec<ObjectNumber>> {
        if weights.is_empty() {
            return Err(EngineError::invalid_sampling("at least one division is needed"));
        }
        check_interval(low, high)?;

        let divisions = weights.len();
        let mut buckets: Vec<Vec<ObjectNumber>> = vec![Vec::new(); divisions];
        for (p, object) in self.candidates(low, high) {
            buckets[division_of(p, low, high, divisions)].push(object);
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let mut picked = Vec::new();
        for (bucket, weight) in buckets.iter_mut().zip(weights) {
            let (chosen, _) = bucket.partial_shuffle(&mut rng, *weight as usize);
            picked.extend_from_slice(chosen);
        }

        log::info!(
            "Stratified sample over {} divisions of [{}, {}]: {} objects",
            divisions,
            low,
            high,
            picked.len()
        );
        Ok(picked)
    }
}

/// Objects with `attribute` in `[min, max]`, ascending by value.
///
/// Only unclassified objects are returned unless `include_all_classes` is set.
pub fn by_attribute_range(
    table: &dyn TableStore,
    attribute: Attribute,
    min: f64,
    max: f64,
    include_all_classes: bool,
) -> Result<Vec<ObjectNumber>> {
    if min.is_nan() || max.is_nan() || min > max {
        return Err(EngineError::InvalidRange { min, max });
    }
    Ok(table
        .sorted_by(attribute)
        .into_iter()
        .filter(|(v, _)| min <= *v && *v <= max)
        .map(|(_, object)| object)
        .filter(|object| {
            include_all_classes
                || table
                    .classes(*object)
                    .is_some_and(|c| c.manual == ManualClass::Unclassified)
        })
        .collect())
}

/// Bell-shaped weights over `divisions` summing to `total`.
pub fn gaussian_profile(divisions: usize, total: u32) -> Vec<u32> {
    if divisions == 0 {
        return Vec::new();
    }
    let center = (divisions as f64 - 1.0) / 2.0;
    let sigma = (divisions as f64 / 4.0).max(0.5);
    let raw: Vec<f64> = (0..divisions)
        .map(|i| (-0.5 * ((i as f64 - center) / sigma).powi(2)).exp())
        .collect();
    let sum: f64 = raw.iter().sum();

    let shares: Vec<f64> = raw.iter().map(|w| w / sum * total as f64).collect();
    let mut weights: Vec<u32> = shares.iter().map(|s| s.floor() as u32).collect();

    // Hand the rounding remainder to the largest fractional parts.
    let assigned: u32 = weights.iter().sum();
    let mut order: Vec<usize> = (0..divisions).collect();
    order.sort_by(|a, b| {
        let fa = shares[*a] - shares[*a].floor();
        let fb = shares[*b] - shares[*b].floor();
        fb.total_cmp(&fa).then(a.cmp(b))
    });
    for i in order.into_iter().take(total.saturating_sub(assigned) as usize) {
        weights[i] += 1;
    }
    weights
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_division_of() {
        assert_eq!(division_of(0.0, 0.0, 1.0, 4), 0);
        assert_eq!(division_of(0.3, 0.0, 1.0, 4), 1);
        assert_eq!(division_of(0.5, 0.0, 1.0, 4), 2);
        assert_eq!(division_of(1.0, 0.0, 1.0, 4), 3);
        assert_eq!(division_of(0.5, 0.5, 0.5, 4), 0);
    }

    #[test]
    fn test_gaussian_profile() {
        let weights = gaussian_profile(7, 20);
        assert_eq!(weights.len(), 7);
        assert_eq!(weights.iter().sum::<u32>(), 20);
        assert!(weights[3] >= weights[2] && weights[2] >= weights[1] && weights[1] >= weights[0]);
        assert_eq!(weights[0], weights[6]);
        assert!(gaussian_profile(0, 10).is_empty());
        assert_eq!(gaussian_profile(1, 5), vec![5]);
    }

    #[test]
    fn test_invalid_interval() {
        assert!(check_interval(0.2, 0.8).is_ok());
        assert!(check_interval(0.5, 0.5).is_ok());
        assert!(matches!(
            check_interval(0.8, 0.2),
            Err(EngineError::InvalidSampling(_))
        ));
        assert!(check_interval(f64::NAN, 1.0).is_err());
    }
}
