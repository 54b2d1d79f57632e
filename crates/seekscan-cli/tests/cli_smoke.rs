use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use serde_json::{json, Value};

fn seekscan(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_seekscan"))
        .args(args)
        .output()
        .expect("run seekscan")
}

fn stdout_json(output: &Output) -> Value {
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let text = String::from_utf8_lossy(&output.stdout);
    let line = text.lines().last().expect("json line");
    serde_json::from_str(line).expect("valid json")
}

fn header(x: f64, y: f64) -> Value {
    json!({
        "stage_position": {"x": x, "y": y},
        "binning": 1,
        "exposure": 0.1,
        "magnification": 2500
    })
}

fn write_observations(dir: &Path) -> String {
    let observations = json!([
        header(50.0, 0.0),
        header(0.0, 50.0),
        header(-50.0, 0.0),
        header(1050.0, 0.0),
        header(1000.0, 50.0),
        header(950.0, 0.0)
    ]);
    let path = dir.join("observations.json");
    fs::write(&path, observations.to_string()).unwrap();
    path.display().to_string()
}

#[test]
fn grid_reports_tile_summary() {
    let output = seekscan(&["grid", "--radius", "75", "--box-x", "10"]);
    let report = stdout_json(&output);
    assert_eq!(report["summary"]["nx"], 13);
    assert!(report["count"].as_u64().unwrap() > 0);
}

#[test]
fn prepare_then_run_unattended() {
    let dir = tempfile::tempdir().unwrap();
    let dir_arg = dir.path().display().to_string();
    let observations = write_observations(dir.path());

    let summary = stdout_json(&seekscan(&[
        "prepare",
        "--dir",
        &dir_arg,
        "--observations",
        &observations,
    ]));
    assert_eq!(summary["holes"], 2);
    assert!(dir.path().join("experiment.json").is_file());

    let output = seekscan(&["run", "--dir", &dir_arg, "--unattended", "--seed", "3"]);
    assert!(
        output.status.success(),
        "run failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let report: Value =
        serde_json::from_slice(&fs::read(dir.path().join("scan/scan_report.json")).unwrap())
            .unwrap();
    assert_eq!(report["completed"], true);
    assert_eq!(report["holes_visited"], 2);
    let ledger = fs::read_to_string(dir.path().join("scan/ledger.csv")).unwrap();
    assert!(ledger.starts_with("kind,hole,offset,object"));
    assert!(ledger.contains("image_0001_0000"));
}

#[test]
fn reconcile_applies_the_mean_shift() {
    let dir = tempfile::tempdir().unwrap();
    let dir_arg = dir.path().display().to_string();
    let observations = write_observations(dir.path());
    stdout_json(&seekscan(&[
        "prepare",
        "--dir",
        &dir_arg,
        "--observations",
        &observations,
    ]));
    fs::write(
        dir.path().join("hole_positions.json"),
        json!([{"x": 4.0, "y": 2.0}, {"x": 1004.0, "y": 2.0}]).to_string(),
    )
    .unwrap();

    let summary = stdout_json(&seekscan(&["reconcile", "--dir", &dir_arg]));
    assert_eq!(summary["contributing"], 2);
    let correction = &summary["correction"];
    assert!((correction["x"].as_f64().unwrap() - 4.0).abs() < 1e-6);
    assert!((correction["y"].as_f64().unwrap() - 2.0).abs() < 1e-6);

    let experiment: Value =
        serde_json::from_slice(&fs::read(dir.path().join("experiment.json")).unwrap()).unwrap();
    assert_eq!(experiment["planned_centers"].as_array().unwrap().len(), 2);
}

#[test]
fn map_holes_merges_detections() {
    let dir = tempfile::tempdir().unwrap();
    let dir_arg = dir.path().display().to_string();
    let detections = json!([
        {"stage_position": {"x": 0.0, "y": 0.0}, "centroids": [{"x": 512.0, "y": 512.0}]},
        {"stage_position": {"x": 100.0, "y": 0.0}, "centroids": [{"x": 512.0, "y": 512.0}]},
        {"stage_position": {"x": 90000.0, "y": 0.0}, "centroids": [{"x": 512.0, "y": 512.0}]}
    ]);
    let path = dir.path().join("detections.json");
    fs::write(&path, detections.to_string()).unwrap();

    let map = stdout_json(&seekscan(&[
        "map-holes",
        "--dir",
        &dir_arg,
        "--detections",
        &path.display().to_string(),
    ]));
    assert_eq!(map["raw_count"], 3);
    assert_eq!(map["positions"].as_array().unwrap().len(), 2);
    assert!(dir.path().join("hole_positions.json").is_file());
}

#[test]
fn status_lists_missing_inputs() {
    let dir = tempfile::tempdir().unwrap();
    let dir_arg = dir.path().display().to_string();
    let report = stdout_json(&seekscan(&["status", "--dir", &dir_arg]));
    assert_eq!(report["status"], "incomplete");
    assert!(!seekscan(&["status", "--dir", &dir_arg, "--strict"])
        .status
        .success());
}

#[test]
fn goto_hole_rejects_unknown_index() {
    let dir = tempfile::tempdir().unwrap();
    let dir_arg = dir.path().display().to_string();
    fs::write(
        dir.path().join("hole_positions.json"),
        json!([{"x": 1.0, "y": 2.0}]).to_string(),
    )
    .unwrap();
    assert!(seekscan(&["goto-hole", "0", "--dir", &dir_arg]).status.success());
    assert!(!seekscan(&["goto-hole", "5", "--dir", &dir_arg]).status.success());
}
