//! JSON files on disk backing [`ExperimentStore`].

use std::fs;
use std::path::{Path, PathBuf};

use seekscan_core::errors::SeekError;
use seekscan_core::{Experiment, ExperimentStore, Point2D};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// File name of the persisted experiment.
pub const EXPERIMENT_FILE: &str = "experiment.json";
/// File name of the dense hole map.
pub const HOLE_POSITIONS_FILE: &str = "hole_positions.json";

/// Store keeping one experiment and one hole map under a directory.
#[derive(Debug, Clone)]
pub struct JsonStore {
    root: PathBuf,
}

impl JsonStore {
    /// Uses `root` as the working directory; it is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding the files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the experiment file.
    pub fn experiment_path(&self) -> PathBuf {
        self.root.join(EXPERIMENT_FILE)
    }

    /// Path of the hole map file.
    pub fn hole_positions_path(&self) -> PathBuf {
        self.root.join(HOLE_POSITIONS_FILE)
    }

    /// True when an experiment has been written.
    pub fn has_experiment(&self) -> bool {
        self.experiment_path().is_file()
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, SeekError> {
    let contents = fs::read_to_string(path)
        .map_err(|err| SeekError::persistence("store-read", err, path.display()))?;
    serde_json::from_str(&contents)
        .map_err(|err| SeekError::persistence("store-parse", err, path.display()))
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), SeekError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|err| SeekError::persistence("store-mkdir", err, parent.display()))?;
    }
    let json = serde_json::to_string_pretty(value)
        .map_err(|err| SeekError::persistence("store-serialize", err, path.display()))?;
    fs::write(path, json).map_err(|err| SeekError::persistence("store-write", err, path.display()))
}

impl ExperimentStore for JsonStore {
    fn load_experiment(&self) -> Result<Experiment, SeekError> {
        read_json(&self.experiment_path())
    }

    fn save_experiment(&self, experiment: &Experiment) -> Result<(), SeekError> {
        write_json(&self.experiment_path(), experiment)
    }

    fn load_hole_positions(&self) -> Result<Vec<Point2D>, SeekError> {
        read_json(&self.hole_positions_path())
    }

    fn save_hole_positions(&self, positions: &[Point2D]) -> Result<(), SeekError> {
        write_json(&self.hole_positions_path(), positions)
    }
}
