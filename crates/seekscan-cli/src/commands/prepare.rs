use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use seekscan_core::ImageHeader;
use seekscan_geom::{CircleFit, GridSummary};
use seekscan_plan::{
    fit_holes_from_headers, prepare_and_store, HoleSampler, JsonStore, PlanConfig, RadiusStats,
};

use crate::operator::StdinOperator;
use crate::sim::SimulatedMicroscope;

use super::render_json;

#[derive(Args, Debug)]
pub struct PrepareArgs {
    /// Working directory receiving `experiment.json`.
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,
    /// YAML planner settings; defaults apply when absent.
    #[arg(long)]
    pub plan: Option<PathBuf>,
    /// JSON list of image headers, grouped per hole.
    #[arg(long, required_unless_present = "interactive")]
    pub observations: Option<PathBuf>,
    /// Sample holes with the operator at the terminal.
    #[arg(long, conflicts_with = "observations")]
    pub interactive: bool,
}

#[derive(Debug, Serialize)]
struct PrepareSummary {
    holes: usize,
    offsets: usize,
    radius: RadiusStats,
    relative_spread: f64,
    fingerprint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    grid: Option<GridSummary>,
}

fn load_plan(args: &PrepareArgs) -> Result<PlanConfig, Box<dyn Error>> {
    match &args.plan {
        Some(path) => {
            let text = fs::read_to_string(path)?;
            if text.trim().is_empty() {
                Ok(PlanConfig::default())
            } else {
                Ok(serde_yaml::from_str(&text)?)
            }
        }
        None => Ok(PlanConfig::default()),
    }
}

fn sample_interactively(config: &PlanConfig) -> Result<Vec<CircleFit>, Box<dyn Error>> {
    let microscope = SimulatedMicroscope::new(config.simulation_seed);
    let mut operator = StdinOperator;
    let sampler = HoleSampler::new(&microscope, &mut operator, config.simulation_seed);
    let fits = sampler.collect::<Result<Vec<_>, _>>()?;
    Ok(fits)
}

pub fn run(args: &PrepareArgs) -> Result<(), Box<dyn Error>> {
    let config = load_plan(args)?;
    config.validate()?;
    let fits = if args.interactive {
        sample_interactively(&config)?
    } else if let Some(path) = &args.observations {
        let headers: Vec<ImageHeader> = serde_json::from_str(&fs::read_to_string(path)?)?;
        fit_holes_from_headers(&headers, &config)?
    } else {
        return Err("either --observations or --interactive is required".into());
    };

    let store = JsonStore::new(&args.dir);
    let prepared = prepare_and_store(&fits, &config, &store)?;
    let summary = PrepareSummary {
        holes: prepared.experiment.holes.len(),
        offsets: prepared.experiment.offset_grid.len(),
        radius: prepared.radius_stats,
        relative_spread: prepared.radius_stats.relative(),
        fingerprint: prepared.experiment.provenance.fingerprint.clone(),
        grid: prepared.grid_summary,
    };
    println!("{}", render_json(&summary)?);
    Ok(())
}
