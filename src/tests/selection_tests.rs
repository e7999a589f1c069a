//! Selection overlay and manual reclassification.

use super::*;
use crate::manual_log::ManualClassLog;
use crate::model::{Axis, ClassTriple, FilterClass, ManualClass};
use crate::selection::{ReclassifyOutcome, SelectMode, SelectionController};
use crate::stats::ClassificationStats;
use crate::store::{ObjectTable, TableStore};

const BACKGROUND: Voxel = Voxel { x: 0, y: 1, z: 0 };

fn setup() -> (ImageState, ClassificationCodec, SelectionController) {
    let codec = ClassificationCodec::default();
    let image = painted_image(&LENGTHS, &codec);
    (image, codec, SelectionController::new())
}

/// Objects currently painted with a selection marker.
fn marked_objects(image: &ImageState, codec: &ClassificationCodec) -> Vec<ObjectNumber> {
    image
        .table()
        .object_numbers()
        .filter(|o| image.flag_of(*o).is_ok_and(|f| codec.is_selected_flag(f)))
        .collect()
}

#[test]
fn test_select_paints_marker_and_background_restores() {
    let (mut image, codec, mut selection) = setup();
    let before = image.flag_of(3).unwrap();

    let picked = selection
        .select_object(&mut image, &codec, Voxel::new(4, 4, 0), SelectMode::RespectClass)
        .unwrap();
    assert_eq!(picked, Some(3));

    let marker = codec.selected_flag(ManualClass::Unclassified.index()).unwrap();
    assert_eq!(image.flag_of(3).unwrap(), marker);
    assert_eq!(image.voxels().read_flag(Voxel::new(11, 4, 0)), Some(marker));
    assert_eq!(selection.selected().unwrap().unselected_flag, before);

    assert_eq!(selection.select_background_click(&mut image).unwrap(), Some(3));
    assert_eq!(image.flag_of(3).unwrap(), before);
    assert!(selection.selected().is_none());
    assert_all_consistent(&image, &codec);

    // A second click on background is a no-op.
    assert_eq!(selection.select_background_click(&mut image).unwrap(), None);
}

#[test]
fn test_selecting_another_object_restores_previous() {
    let (mut image, codec, mut selection) = setup();
    let first_flag = image.flag_of(1).unwrap();

    selection
        .select_object(&mut image, &codec, line_origin(1), SelectMode::RespectClass)
        .unwrap();
    selection
        .select_object(&mut image, &codec, line_origin(2), SelectMode::Highlight)
        .unwrap();

    assert_eq!(image.flag_of(1).unwrap(), first_flag);
    assert_eq!(image.flag_of(2).unwrap(), codec.highlight_flag());
    assert_eq!(marked_objects(&image, &codec), vec![2]);
    assert!(selection.is_selected(2));
    assert!(!selection.is_selected(1));
}

#[test]
fn test_clicking_background_through_select_object() {
    let (mut image, codec, mut selection) = setup();
    selection
        .select_object(&mut image, &codec, line_origin(2), SelectMode::RespectClass)
        .unwrap();

    let picked = selection
        .select_object(&mut image, &codec, BACKGROUND, SelectMode::RespectClass)
        .unwrap();
    assert_eq!(picked, None);
    assert!(selection.selected().is_none());
    assert!(marked_objects(&image, &codec).is_empty());
    assert_all_consistent(&image, &codec);
}

#[test]
fn test_select_outside_volume() {
    let (mut image, codec, mut selection) = setup();
    let result = selection.select_object(
        &mut image,
        &codec,
        Voxel::new(500, 0, 0),
        SelectMode::RespectClass,
    );
    assert!(matches!(result, Err(EngineError::NoObjectAtVoxel(_))));
}

#[test]
fn test_reselecting_marked_object_recovers_true_flag() {
    let (mut image, codec, mut selection) = setup();
    let classified = image.flag_of(2).unwrap();

    selection
        .select_object(&mut image, &codec, line_origin(2), SelectMode::Highlight)
        .unwrap();
    selection
        .select_object(&mut image, &codec, Voxel::new(3, 2, 0), SelectMode::RespectClass)
        .unwrap();

    let selected = selection.selected().unwrap();
    assert_eq!(selected.unselected_flag, classified);
    assert_eq!(selected.mode, SelectMode::RespectClass);

    selection.select_background_click(&mut image).unwrap();
    assert_eq!(image.flag_of(2).unwrap(), classified);
}

#[test]
fn test_reclassify_updates_every_store() {
    let (mut image, codec, mut selection) = setup();
    let mut log = ManualClassLog::new();

    selection
        .select_object(&mut image, &codec, line_origin(4), SelectMode::RespectClass)
        .unwrap();
    let outcome = selection
        .reclassify(&mut image, &codec, &mut log, ManualClass::Feature)
        .unwrap();
    assert_eq!(
        outcome,
        ReclassifyOutcome::Reclassified {
            object: 4,
            from: ManualClass::Unclassified,
            to: ManualClass::Feature,
        }
    );

    assert_eq!(image.classes(4).unwrap().manual, ManualClass::Feature);
    assert_eq!(image.stats().feature, 1);
    assert_eq!(image.stats().total, LENGTHS.len());
    assert_eq!(log.get("lines", 4), Some(ManualClass::Feature));
    assert_eq!(
        image.flag_of(4).unwrap(),
        codec.selected_flag(ManualClass::Feature.index()).unwrap()
    );
    assert_eq!(
        selection.selected().unwrap().unselected_flag,
        codec.encode_triple(&image.classes(4).unwrap()).unwrap()
    );

    selection.select_background_click(&mut image).unwrap();
    let expected = ClassTriple::new(ManualClass::Feature, FilterClass::Passed, ObjectClass::Feature);
    assert_eq!(image.flag_of(4).unwrap(), codec.encode_triple(&expected).unwrap());
    assert_all_consistent(&image, &codec);
}

#[test]
fn test_reclassify_to_current_class_keeps_true_flag() {
    let (mut image, codec, mut selection) = setup();
    let mut log = ManualClassLog::new();

    selection
        .select_object(&mut image, &codec, line_origin(5), SelectMode::Highlight)
        .unwrap();
    selection
        .reclassify(&mut image, &codec, &mut log, ManualClass::NonFeature)
        .unwrap();
    let outcome = selection
        .reclassify(&mut image, &codec, &mut log, ManualClass::NonFeature)
        .unwrap();
    assert_eq!(outcome, ReclassifyOutcome::Unchanged(ManualClass::NonFeature));
    assert_eq!(image.stats().non_feature, 1);
    assert_eq!(selection.selected().unwrap().mode, SelectMode::RespectClass);

    selection.select_background_click(&mut image).unwrap();
    let flag = image.flag_of(5).unwrap();
    assert!(!codec.is_selected_flag(flag));
    assert_eq!(codec.decode(flag, Axis::Manual).unwrap(), ManualClass::NonFeature.index());
    assert_all_consistent(&image, &codec);
}

#[test]
fn test_reclassify_to_unclassified_removes_log_entry() {
    let (mut image, codec, mut selection) = setup();
    let mut log = ManualClassLog::new();

    selection
        .select_object(&mut image, &codec, line_origin(6), SelectMode::RespectClass)
        .unwrap();
    selection
        .reclassify(&mut image, &codec, &mut log, ManualClass::Connected)
        .unwrap();
    assert_eq!(log.len(), 1);

    selection
        .reclassify(&mut image, &codec, &mut log, ManualClass::Unclassified)
        .unwrap();
    assert!(log.is_empty());
    assert_eq!(image.stats().classified(), 0);
    assert_eq!(image.classes(6).unwrap().manual, ManualClass::Unclassified);
}

#[test]
fn test_reclassify_without_selection() {
    let (mut image, codec, mut selection) = setup();
    let mut log = ManualClassLog::new();

    let outcome = selection
        .reclassify(&mut image, &codec, &mut log, ManualClass::Feature)
        .unwrap();
    assert_eq!(outcome, ReclassifyOutcome::NothingSelected);
    assert!(log.is_empty());
    assert_eq!(image.stats().classified(), 0);
}

#[test]
fn test_stats_match_recount_after_reclassify_sequence() {
    let (mut image, codec, mut selection) = setup();
    let mut log = ManualClassLog::new();

    let script = [
        (1, ManualClass::Feature),
        (2, ManualClass::NonFeature),
        (1, ManualClass::Connected),
        (3, ManualClass::Feature),
        (2, ManualClass::NonFeature),
        (1, ManualClass::Unclassified),
        (4, ManualClass::Connected),
        (3, ManualClass::NonFeature),
    ];
    for (object, class) in script {
        selection
            .select_object(&mut image, &codec, line_origin(object), SelectMode::RespectClass)
            .unwrap();
        selection.reclassify(&mut image, &codec, &mut log, class).unwrap();
        assert_eq!(*image.stats(), ClassificationStats::from_table(image.table()));
    }

    assert_eq!(image.stats().feature, 0);
    assert_eq!(image.stats().non_feature, 2);
    assert_eq!(image.stats().connected, 1);
    assert_eq!(log.len(), 3);
}

#[test]
fn test_desynchronized_flag_is_rejected() {
    let (mut image, codec, mut selection) = setup();
    let wrong = codec
        .encode_triple(&ClassTriple::new(
            ManualClass::Feature,
            FilterClass::Passed,
            ObjectClass::Feature,
        ))
        .unwrap();
    image.write_flag(line_origin(6), wrong).unwrap();

    let result = selection.select_object(&mut image, &codec, line_origin(6), SelectMode::RespectClass);
    assert!(matches!(
        result,
        Err(EngineError::Desynchronized { object: 6, .. })
    ));
    assert!(matches!(
        image.set_axis(&codec, 6, Axis::Filter, FilterClass::NotPassed.index()),
        Err(EngineError::Desynchronized { object: 6, .. })
    ));
    assert_eq!(image.classes(6).unwrap().filter, FilterClass::Passed);
}

/// Table that refuses manual class writes.
struct ReadOnlyManual(ObjectTable);

impl TableStore for ReadOnlyManual {
    fn row_count(&self) -> usize {
        self.0.row_count()
    }

    fn attribute(&self, object: ObjectNumber, attribute: Attribute) -> Option<f64> {
        self.0.attribute(object, attribute)
    }

    fn classes(&self, object: ObjectNumber) -> Option<ClassTriple> {
        self.0.classes(object)
    }

    fn first_voxel(&self, object: ObjectNumber) -> Option<Voxel> {
        self.0.first_voxel(object)
    }

    fn set_axis(&mut self, object: ObjectNumber, axis: Axis, index: usize) -> Result<()> {
        if axis == Axis::Manual {
            return Err(EngineError::UnknownObject(object));
        }
        self.0.set_axis(object, axis, index)
    }
}

#[test]
fn test_failed_record_write_leaves_counts_and_log() {
    let codec = ClassificationCodec::default();
    let synthetic = line_volume(&LENGTHS);
    let mut image = ImageState::new(
        "lines",
        Box::new(synthetic.voxels),
        Box::new(ReadOnlyManual(synthetic.table)),
    );
    image.paint_all(&codec).unwrap();
    let mut selection = SelectionController::new();
    let mut log = ManualClassLog::new();

    selection
        .select_object(&mut image, &codec, line_origin(4), SelectMode::RespectClass)
        .unwrap();
    let marker = image.flag_of(4).unwrap();

    let result = selection.reclassify(&mut image, &codec, &mut log, ManualClass::Feature);
    assert_eq!(result, Err(EngineError::UnknownObject(4)));
    assert_eq!(image.stats().feature, 0);
    assert_eq!(image.stats().classified(), 0);
    assert!(log.is_empty());
    assert_eq!(image.classes(4).unwrap().manual, ManualClass::Unclassified);
    assert_eq!(image.flag_of(4).unwrap(), marker);

    assert_eq!(selection.select_background_click(&mut image).unwrap(), Some(4));
    assert_all_consistent(&image, &codec);
}
