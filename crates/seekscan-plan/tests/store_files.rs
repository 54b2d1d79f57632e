mod common;

use common::experiment_with_centers;
use seekscan_core::{ExperimentStore, Point2D, SeekError};
use seekscan_plan::{JsonStore, EXPERIMENT_FILE};

#[test]
fn experiment_survives_a_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonStore::new(dir.path().join("nested"));
    let mut experiment = experiment_with_centers(&[Point2D::new(-1.5, 2.25)], 3.0);
    experiment.stamp().unwrap();
    store.save_experiment(&experiment).unwrap();
    assert!(store.has_experiment());
    assert!(dir.path().join("nested").join(EXPERIMENT_FILE).is_file());
    assert_eq!(store.load_experiment().unwrap(), experiment);
}

#[test]
fn hole_positions_survive_a_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonStore::new(dir.path());
    let positions = vec![Point2D::new(1.0, 2.0), Point2D::new(3.0, 4.0)];
    store.save_hole_positions(&positions).unwrap();
    assert_eq!(store.load_hole_positions().unwrap(), positions);
}

#[test]
fn missing_file_is_a_persistence_error_with_path() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonStore::new(dir.path());
    let err = store.load_experiment().unwrap_err();
    match err {
        SeekError::Persistence(info) => {
            assert_eq!(info.code, "store-read");
            assert!(info.context["path"].ends_with(EXPERIMENT_FILE));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn corrupt_file_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(EXPERIMENT_FILE), b"{ not json").unwrap();
    let store = JsonStore::new(dir.path());
    let err = store.load_experiment().unwrap_err();
    assert!(matches!(err, SeekError::Persistence(ref info) if info.code == "store-parse"));
}

#[test]
fn legacy_record_without_provenance_still_loads() {
    let dir = tempfile::tempdir().unwrap();
    let json = r#"{
        "holes": [{"center": {"x": 1.0, "y": 2.0}, "radius": 5.0}],
        "offset_grid": [{"x": 0.0, "y": 0.0}],
        "radius": 5.0
    }"#;
    std::fs::write(dir.path().join(EXPERIMENT_FILE), json).unwrap();
    let experiment = JsonStore::new(dir.path()).load_experiment().unwrap();
    assert_eq!(experiment.holes.len(), 1);
    assert!(experiment.stage_correction.is_none());
    assert!(experiment.planned_centers.is_empty());
}
