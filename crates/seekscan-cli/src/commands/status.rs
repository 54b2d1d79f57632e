use std::error::Error;
use std::path::{Path, PathBuf};

use clap::Args;
use serde::Serialize;

use seekscan_core::ExperimentStore;
use seekscan_exec::ScanConfig;
use seekscan_plan::JsonStore;

use super::{
    load_calibration, render_json, resolve_scan_config_path, BEAMSHIFT_CALIBRATION_FILE,
    STAGE_CALIBRATION_FILE,
};

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Working directory to inspect.
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,
    /// Scan parameters to validate (defaults to `scan.yaml` in the directory).
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Fail when any check is not ok.
    #[arg(long)]
    pub strict: bool,
}

#[derive(Debug, Serialize)]
struct StatusCheck {
    name: String,
    ok: bool,
    detail: String,
}

#[derive(Debug, Serialize)]
struct StatusReport {
    status: String,
    checks: Vec<StatusCheck>,
}

fn check<T>(name: &str, result: Result<T, impl ToString>, detail: impl Fn(&T) -> String) -> StatusCheck {
    match result {
        Ok(value) => StatusCheck {
            name: name.to_string(),
            ok: true,
            detail: detail(&value),
        },
        Err(err) => StatusCheck {
            name: name.to_string(),
            ok: false,
            detail: err.to_string(),
        },
    }
}

fn diagnose(dir: &Path, config: Option<&PathBuf>) -> StatusReport {
    let store = JsonStore::new(dir);
    let mut checks = vec![
        check(
            "stage calibration",
            load_calibration(&dir.join(STAGE_CALIBRATION_FILE)),
            |_| STAGE_CALIBRATION_FILE.to_string(),
        ),
        check(
            "beamshift calibration",
            load_calibration(&dir.join(BEAMSHIFT_CALIBRATION_FILE)),
            |_| BEAMSHIFT_CALIBRATION_FILE.to_string(),
        ),
        check("hole positions", store.load_hole_positions(), |positions| {
            format!("{} mapped holes", positions.len())
        }),
        check("experiment", store.load_experiment(), |experiment| {
            format!(
                "{} holes, {} offsets, radius {:.3}",
                experiment.holes.len(),
                experiment.offset_grid.len(),
                experiment.radius
            )
        }),
    ];
    let params = match resolve_scan_config_path(config, dir) {
        Some(path) => ScanConfig::from_yaml_path(&path),
        None => Ok(ScanConfig::default()),
    };
    checks.push(check(
        "scan parameters",
        params.and_then(|params| params.validate().map(|_| params)),
        |params| {
            format!(
                "imaging bin {} exp {}, diffraction bin {} exp {}",
                params.image_binning, params.image_exposure, params.diff_binning, params.diff_exposure
            )
        },
    ));
    let ready = checks.iter().all(|check| check.ok);
    StatusReport {
        status: if ready { "ok" } else { "incomplete" }.to_string(),
        checks,
    }
}

pub fn run(args: &StatusArgs) -> Result<(), Box<dyn Error>> {
    let report = diagnose(&args.dir, args.config.as_ref());
    for check in &report.checks {
        let mark = if check.ok { "ok" } else { "--" };
        println!("[{mark}] {}: {}", check.name, check.detail);
    }
    println!("{}", render_json(&report)?);
    if args.strict && report.status != "ok" {
        return Err("one or more checks failed".into());
    }
    Ok(())
}
