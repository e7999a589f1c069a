//! Candidate sampling over oracle probabilities and attribute ranges.

use std::sync::Arc;

use super::*;
use crate::model::ManualClass;
use crate::sampling::gaussian_profile;

/// Probability of the stub oracle for each object in [`LENGTHS`].
fn probability_of(object: ObjectNumber) -> f64 {
    StubOracle::probability(LENGTHS[object as usize - 1] as f64)
}

fn classified_engine() -> Engine {
    let mut engine = loaded_engine(&LENGTHS);
    engine
        .apply_classifier(Arc::new(StubOracle::new()), false)
        .expect("Failed to apply classifier");
    engine
}

fn sorted(mut objects: Vec<ObjectNumber>) -> Vec<ObjectNumber> {
    objects.sort_unstable();
    objects
}

#[test]
fn test_uniform_respects_interval() {
    let engine = classified_engine();

    let picked = engine.sample_uniform(100, 0.1, 0.3, 1).unwrap();
    assert_eq!(sorted(picked), vec![2, 3, 4, 5, 6, 7]);

    let picked = engine.sample_uniform(3, 0.0, 1.0, 9).unwrap();
    assert_eq!(picked.len(), 3);
    for object in &picked {
        let p = probability_of(*object);
        assert!((0.0..=1.0).contains(&p));
    }
    let mut distinct = sorted(picked);
    distinct.dedup();
    assert_eq!(distinct.len(), 3);
}

#[test]
fn test_uniform_is_reproducible() {
    let engine = classified_engine();
    let a = engine.sample_uniform(4, 0.0, 1.0, 1234).unwrap();
    let b = engine.sample_uniform(4, 0.0, 1.0, 1234).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_classified_objects_are_not_sampled() {
    let mut engine = classified_engine();
    engine.present(4).unwrap();
    engine.reclassify(ManualClass::Feature).unwrap();
    engine.select_background_click().unwrap();

    let picked = engine.sample_uniform(100, 0.0, 1.0, 3).unwrap();
    assert_eq!(picked.len(), LENGTHS.len() - 1);
    assert!(!picked.contains(&4));
}

#[test]
fn test_no_candidates_is_empty_not_error() {
    let engine = classified_engine();
    assert!(engine.sample_uniform(5, 0.95, 1.0, 0).unwrap().is_empty());
    assert!(engine
        .sample_stratified_linear(4, 0.95, 1.0, 0)
        .unwrap()
        .is_empty());
}

#[test]
fn test_stratified_linear_one_per_filled_division() {
    let engine = classified_engine();

    // Quarters of [0, 1]: objects 1-6 | 7 | 8, 9 | none
    let picked = engine.sample_stratified_linear(4, 0.0, 1.0, 5).unwrap();
    assert_eq!(picked.len(), 3);
    assert!(picked.contains(&7));
    assert_eq!(picked.iter().filter(|o| (1..=6).contains(*o)).count(), 1);
    assert_eq!(picked.iter().filter(|o| [8, 9].contains(*o)).count(), 1);
}

#[test]
fn test_stratified_weighted_draws_per_weight() {
    let engine = classified_engine();

    let picked = engine
        .sample_stratified_weighted(&[2, 0, 5, 1], 0.0, 1.0, 5)
        .unwrap();
    assert_eq!(picked.len(), 4);
    assert_eq!(picked.iter().filter(|o| (1..=6).contains(*o)).count(), 2);
    assert!(!picked.contains(&7));
    assert!(picked.contains(&8) && picked.contains(&9));

    let profile = gaussian_profile(5, 10);
    let picked = engine
        .sample_stratified_weighted(&profile, 0.1, 0.5, 5)
        .unwrap();
    for object in picked {
        let p = probability_of(object);
        assert!((0.1..=0.5).contains(&p), "object {} has p = {}", object, p);
    }
}

#[test]
fn test_invalid_sampling_requests() {
    let engine = classified_engine();
    assert!(matches!(
        engine.sample_stratified_linear(0, 0.0, 1.0, 0),
        Err(EngineError::InvalidSampling(_))
    ));
    assert!(matches!(
        engine.sample_stratified_weighted(&[], 0.0, 1.0, 0),
        Err(EngineError::InvalidSampling(_))
    ));
    assert!(matches!(
        engine.sample_uniform(3, 0.8, 0.2, 0),
        Err(EngineError::InvalidSampling(_))
    ));
}

#[test]
fn test_oracle_sampling_needs_classifier() {
    let engine = loaded_engine(&LENGTHS);
    assert!(matches!(
        engine.sample_uniform(3, 0.0, 1.0, 0),
        Err(EngineError::OracleUnavailable(_))
    ));
}

#[test]
fn test_by_attribute_range_is_ascending() {
    let mut engine = loaded_engine(&[30, 5, 20, 45]);

    let picked = engine
        .sample_by_attribute_range(Attribute::Volume, 0.0, 40.0, false)
        .unwrap();
    assert_eq!(picked, vec![2, 3, 1]);

    engine.present(3).unwrap();
    engine.reclassify(ManualClass::NonFeature).unwrap();
    assert_eq!(
        engine
            .sample_by_attribute_range(Attribute::Volume, 0.0, 40.0, false)
            .unwrap(),
        vec![2, 1]
    );
    assert_eq!(
        engine
            .sample_by_attribute_range(Attribute::Volume, 5.0, 45.0, true)
            .unwrap(),
        vec![2, 3, 1, 4]
    );
    assert!(matches!(
        engine.sample_by_attribute_range(Attribute::Volume, 10.0, 1.0, true),
        Err(EngineError::InvalidRange { .. })
    ));
}
