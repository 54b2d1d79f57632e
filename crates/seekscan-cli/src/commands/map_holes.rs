use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::Args;

use seekscan_core::{CaptureRequest, ExperimentStore, Microscope, Point2D};
use seekscan_plan::{
    map_holes_on_grid, merge_detections, FrameDetections, HoleMap, HoleMapOptions, JsonStore,
    MappingFrame,
};

use crate::sim::{SimulatedMicroscope, ThresholdDetector};

use super::{render_json, resolve_calibration, STAGE_CALIBRATION_FILE};

#[derive(Args, Debug)]
pub struct MapHolesArgs {
    /// Working directory holding calibrations and results.
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,
    /// JSON list of per-frame detections (`stage_position`, `centroids`).
    #[arg(long, conflicts_with = "survey")]
    pub detections: Option<PathBuf>,
    /// Survey an N × N stage grid with the simulated microscope instead.
    #[arg(long, value_name = "N")]
    pub survey: Option<usize>,
    /// Stage step between survey frames.
    #[arg(long, default_value_t = 50_000.0)]
    pub step: f64,
    /// Expected hole area in unbinned pixels, for survey mode.
    #[arg(long, default_value_t = 2000.0)]
    pub expected_area: f64,
    /// Stage distance under which observations merge into one hole.
    #[arg(long, default_value_t = 10_000.0)]
    pub threshold: f64,
    /// Stage calibration file (defaults to the working directory copy).
    #[arg(long)]
    pub stage_calibration: Option<PathBuf>,
    /// Seed of the simulated survey.
    #[arg(long, default_value_t = 0)]
    pub seed: u64,
}

pub fn run(args: &MapHolesArgs) -> Result<(), Box<dyn Error>> {
    let calibration = resolve_calibration(
        args.stage_calibration.as_deref(),
        &args.dir,
        STAGE_CALIBRATION_FILE,
        Point2D::new(512.0, 512.0),
    )?;
    let map = if let Some(path) = &args.detections {
        let detections: Vec<FrameDetections> = serde_json::from_str(&fs::read_to_string(path)?)?;
        merge_detections(&detections, &calibration, args.threshold)?
    } else if let Some(n) = args.survey {
        survey(args, n, &calibration)?
    } else {
        return Err("either --detections or --survey is required".into());
    };

    JsonStore::new(&args.dir).save_hole_positions(&map.positions)?;
    println!("{}", render_json(&map)?);
    Ok(())
}

fn survey(
    args: &MapHolesArgs,
    n: usize,
    calibration: &seekscan_core::AffineCalibration,
) -> Result<HoleMap, Box<dyn Error>> {
    let mut microscope = SimulatedMicroscope::new(args.seed);
    let half = (n.saturating_sub(1)) as f64 / 2.0;
    let mut frames = Vec::with_capacity(n * n);
    for row in 0..n {
        for col in 0..n {
            let target = Point2D::new(
                (col as f64 - half) * args.step,
                (row as f64 - half) * args.step,
            );
            if let Err(err) = microscope.move_stage(target) {
                tracing::warn!(%target, %err, "survey position skipped");
                continue;
            }
            let request = CaptureRequest {
                binning: 1,
                exposure: 0.5,
                comment: format!("survey {row} {col}"),
                out_name: format!("survey_{row:04}_{col:04}"),
            };
            let (image, header) = microscope.capture_image(&request)?;
            frames.push(MappingFrame { image, header });
        }
    }
    let options = HoleMapOptions {
        threshold: args.threshold,
        ..HoleMapOptions::new(args.expected_area)
    };
    Ok(map_holes_on_grid(
        &frames,
        &ThresholdDetector::default(),
        calibration,
        &options,
    )?)
}
