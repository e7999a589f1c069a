//! Scripted demo session over synthetic volumes.

use std::sync::{Arc, PoisonError};

use ocat::constants::DEFAULT_SYNTHETIC_EXTENT;
use ocat::model::ObjectClass;
use ocat::synthetic::SyntheticVolume;
use ocat::traversal;
use ocat::{Attribute, Engine, EngineConfig, SelectMode, TraversalController, Voxel};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = EngineConfig::load_from_default_path().unwrap_or_default();

    env_logger::Builder::new()
        .filter_level(config.preferences.log_level.to_level_filter())
        .parse_default_env()
        .init();

    let seed = config.sampling.seed;
    let divisions = config.sampling.divisions;
    let mut engine = Engine::new(config);

    let first = SyntheticVolume::with_defaults(seed);
    engine.load_image("synthetic-a", Box::new(first.voxels), Box::new(first.table))?;

    // Label the brightest objects as features and the dimmest as non-features.
    let mut by_intensity = engine.sample_by_attribute_range(
        Attribute::MeanIntensity,
        f64::MIN,
        f64::MAX,
        true,
    )?;
    let dim: Vec<_> = by_intensity.drain(..by_intensity.len().min(4)).collect();
    let bright: Vec<_> = by_intensity.iter().rev().take(4).copied().collect();
    for (objects, class) in [(dim, ObjectClass::NonFeature), (bright, ObjectClass::Feature)] {
        for object in objects {
            engine.present(object)?;
            engine.reclassify(class)?;
        }
    }
    engine.select_background_click()?;

    let oracle = Arc::new(engine.train_centroid_oracle()?);
    let report = engine.apply_classifier(oracle, true)?;
    println!("Classifier updated {} objects", report.updated);

    let report = engine.set_filter(Attribute::Volume, 20.0, f64::MAX)?;
    println!("Filter touched {} objects", report.touched.len());
    let report = engine.set_filter(Attribute::Volume, 40.0, f64::MAX)?;
    println!("Narrowed filter touched {} objects", report.touched.len());

    let candidates = engine.sample_stratified_linear(divisions, 0.0, 1.0, seed)?;
    println!("Review candidates: {:?}", candidates);

    if let Some(voxel) = engine.view().map(|view| view.min) {
        engine.select_object(voxel, SelectMode::Highlight)?;
    }
    // The far corner is always background in generated volumes.
    let corner = DEFAULT_SYNTHETIC_EXTENT - 1;
    engine.select_object(Voxel::new(corner, corner, corner), SelectMode::RespectClass)?;

    let shared = traversal::share(engine);
    let mut session = TraversalController::new(Arc::clone(&shared));
    session.start(candidates)?;
    session.next()?;
    {
        let mut engine = shared.lock().unwrap_or_else(PoisonError::into_inner);
        engine.reclassify(ObjectClass::Connected)?;
    }
    session.next()?;
    session.previous()?;
    session.cancel()?;
    println!("Visited indices: {:?}", session.visited());
    drop(session);

    let mut engine = shared.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(stats) = engine.stats() {
        println!("Statistics: {}", serde_json::to_string(stats)?);
    }

    let second = SyntheticVolume::with_defaults(seed + 1);
    let report = engine.load_image("synthetic-b", Box::new(second.voxels), Box::new(second.table))?;
    if let Some(filter) = engine.filter().active() {
        println!(
            "Carried filter {} [{}, {}] onto {} objects",
            filter.attribute, filter.min, filter.max, report.objects
        );
    }

    let log = ocat::ManualClassLog::from_entries(engine.manual_log().snapshot());
    println!("Manual classifications:\n{}", log.to_json()?);
    Ok(())
}
