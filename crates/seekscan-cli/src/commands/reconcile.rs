use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use seekscan_core::Point2D;
use seekscan_plan::{reconcile_store, HoleMatch, JsonStore};

use super::render_json;

#[derive(Args, Debug)]
pub struct ReconcileArgs {
    /// Working directory holding `experiment.json` and `hole_positions.json`.
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,
}

#[derive(Debug, Serialize)]
struct ReconcileSummary<'a> {
    correction: Point2D,
    contributing: usize,
    holes: usize,
    matches: &'a [HoleMatch],
}

pub fn run(args: &ReconcileArgs) -> Result<(), Box<dyn Error>> {
    let store = JsonStore::new(&args.dir);
    let reconciliation = reconcile_store(&store)?;
    let summary = ReconcileSummary {
        correction: reconciliation.correction,
        contributing: reconciliation.contributing(),
        holes: reconciliation.experiment.holes.len(),
        matches: &reconciliation.matches,
    };
    println!("{}", render_json(&summary)?);
    Ok(())
}
