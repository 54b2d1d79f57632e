use std::error::Error;
use std::path::PathBuf;

use clap::{Args, ValueEnum};

use seekscan_core::{ExperimentStore, Microscope};
use seekscan_plan::JsonStore;

use crate::sim::SimulatedMicroscope;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum HoleSource {
    /// Dense positions from `map-holes`.
    Mapped,
    /// Hole list of the stored experiment.
    Experiment,
}

#[derive(Args, Debug)]
pub struct GotoHoleArgs {
    /// Index of the hole to visit.
    pub index: usize,
    /// Working directory holding the stored positions.
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,
    /// Which stored list the index refers to.
    #[arg(long, value_enum, default_value_t = HoleSource::Mapped)]
    pub source: HoleSource,
}

pub fn run(args: &GotoHoleArgs) -> Result<(), Box<dyn Error>> {
    let store = JsonStore::new(&args.dir);
    let positions = match args.source {
        HoleSource::Mapped => store.load_hole_positions()?,
        HoleSource::Experiment => store.load_experiment()?.centers(),
    };
    let Some(target) = positions.get(args.index).copied() else {
        return Err(format!(
            "hole {} out of range ({} stored)",
            args.index,
            positions.len()
        )
        .into());
    };
    let mut microscope = SimulatedMicroscope::new(0);
    microscope.move_stage(target)?;
    println!("hole {} -> stage {}", args.index, microscope.stage_position()?);
    Ok(())
}
