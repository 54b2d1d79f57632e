use std::error::Error;
use std::path::PathBuf;

use clap::Args;

use seekscan_core::{ExperimentStore, Operator};
use seekscan_exec::{ScanConfig, ScanExecutor};
use seekscan_plan::JsonStore;

use crate::ledger::write_ledger;
use crate::operator::{FixedOperator, StdinOperator};
use crate::sim::{SimulatedMicroscope, ThresholdDetector};

use super::{resolve_calibration, resolve_scan_config_path, write_json, BEAMSHIFT_CALIBRATION_FILE};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Working directory holding the experiment and calibrations.
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,
    /// YAML scan parameters (defaults to `scan.yaml` in the working directory).
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Output directory for the ledger and report.
    #[arg(long)]
    pub out: Option<PathBuf>,
    /// Beamshift calibration file (defaults to the working directory copy).
    #[arg(long)]
    pub beamshift_calibration: Option<PathBuf>,
    /// Answer `auto` at every hole instead of reading the terminal.
    #[arg(long)]
    pub unattended: bool,
    /// Seed of the simulated microscope.
    #[arg(long, default_value_t = 0)]
    pub seed: u64,
}

pub fn run(args: &RunArgs) -> Result<(), Box<dyn Error>> {
    let store = JsonStore::new(&args.dir);
    let experiment = store.load_experiment()?;
    let config = match resolve_scan_config_path(args.config.as_ref(), &args.dir) {
        Some(path) => ScanConfig::from_yaml_path(&path)?,
        None => ScanConfig::default(),
    };
    let calibration = resolve_calibration(
        args.beamshift_calibration.as_deref(),
        &args.dir,
        BEAMSHIFT_CALIBRATION_FILE,
        config.neutral_pixel,
    )?;
    let out = args.out.clone().unwrap_or_else(|| args.dir.join("scan"));

    println!("Usage:");
    println!("    type 'next' to go to the next hole");
    println!("    type 'exit' to interrupt the script");
    println!("    type 'auto' to enable automatic mode (until next hole)");
    println!("    type 'plot' to toggle plotting mode");

    let mut microscope = SimulatedMicroscope::new(args.seed);
    let detector = ThresholdDetector::default();
    let mut stdin_operator = StdinOperator;
    let mut fixed_operator = FixedOperator::new("auto");
    let operator: &mut dyn Operator = if args.unattended {
        &mut fixed_operator
    } else {
        &mut stdin_operator
    };

    let mut executor = ScanExecutor::new(
        &experiment,
        &config,
        &mut microscope,
        &detector,
        &calibration,
        operator,
    );
    let outcome = executor.run();
    let report = executor.report().clone();

    std::fs::create_dir_all(&out)?;
    write_ledger(&out.join("ledger.csv"), &report.acquisitions)?;
    write_json(&out.join("scan_report.json"), &report)?;
    tracing::info!(
        out = %out.display(),
        frames = microscope.frames(),
        "ledger and report written"
    );

    outcome?;
    Ok(())
}
