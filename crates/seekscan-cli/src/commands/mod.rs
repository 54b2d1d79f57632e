pub mod goto_hole;
pub mod grid;
pub mod map_holes;
pub mod prepare;
pub mod reconcile;
pub mod run;
pub mod status;

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use seekscan_core::errors::SeekError;
use seekscan_core::{to_canonical_json_bytes, AffineCalibration, Point2D};

/// Stored pixel-to-stage transform inside the working directory.
pub const STAGE_CALIBRATION_FILE: &str = "calib_stage.json";
/// Stored pixel-to-beamshift transform inside the working directory.
pub const BEAMSHIFT_CALIBRATION_FILE: &str = "calib_beamshift.json";
/// Default scan parameters inside the working directory.
pub const SCAN_CONFIG_FILE: &str = "scan.yaml";

pub fn load_calibration(path: &Path) -> Result<AffineCalibration, SeekError> {
    let contents = fs::read_to_string(path)
        .map_err(|err| SeekError::persistence("calibration-read", err, path.display()))?;
    serde_json::from_str(&contents)
        .map_err(|err| SeekError::persistence("calibration-parse", err, path.display()))
}

/// Explicit path first, then the working directory copy, then identity.
pub fn resolve_calibration(
    explicit: Option<&Path>,
    dir: &Path,
    file_name: &str,
    identity_reference: Point2D,
) -> Result<AffineCalibration, SeekError> {
    if let Some(path) = explicit {
        return load_calibration(path);
    }
    let path = dir.join(file_name);
    if path.is_file() {
        return load_calibration(&path);
    }
    tracing::warn!(file = file_name, "no calibration found, using identity");
    Ok(AffineCalibration::identity(identity_reference))
}

/// Explicit config path first, then `scan.yaml` in the working directory.
pub fn resolve_scan_config_path(explicit: Option<&PathBuf>, dir: &Path) -> Option<PathBuf> {
    explicit.cloned().or_else(|| {
        let path = dir.join(SCAN_CONFIG_FILE);
        path.is_file().then_some(path)
    })
}

pub fn render_json<T: Serialize>(value: &T) -> Result<String, Box<dyn Error>> {
    let bytes = to_canonical_json_bytes(value).map_err(|err| Box::new(err) as Box<dyn Error>)?;
    Ok(String::from_utf8(bytes)?)
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, render_json(value)?)?;
    Ok(())
}
