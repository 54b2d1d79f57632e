use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use seekscan_geom::{GridSummary, TileSpec};
use seekscan_plan::{build_offset_grid, GridPlan};

use super::{render_json, write_json};

#[derive(Args, Debug)]
pub struct GridArgs {
    /// Hole radius in stage units.
    #[arg(long)]
    pub radius: f64,
    /// Width of one acquisition; tiles the hole by field of view when set.
    #[arg(long, conflicts_with = "nx")]
    pub box_x: Option<f64>,
    /// Height of one acquisition (defaults to the width).
    #[arg(long, requires = "box_x")]
    pub box_y: Option<f64>,
    /// Gap between neighbouring tiles.
    #[arg(long, default_value_t = 2.0)]
    pub padding: f64,
    /// Border scale factor.
    #[arg(long, default_value_t = 1.0)]
    pub k: f64,
    /// Grid rotation in radians.
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub angle: f64,
    /// Lattice columns when no tile size is given.
    #[arg(long)]
    pub nx: Option<usize>,
    /// Lattice rows (defaults to the columns).
    #[arg(long)]
    pub ny: Option<usize>,
    /// Relative lattice border.
    #[arg(long, default_value_t = 0.8)]
    pub borderwidth: f64,
    /// Write the offsets to this JSON file.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct GridReport {
    plan: GridPlan,
    radius: f64,
    count: usize,
    max_norm: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<GridSummary>,
}

impl GridArgs {
    fn plan(&self) -> GridPlan {
        match self.box_x {
            Some(box_x) => GridPlan::Tiled(TileSpec {
                box_x,
                box_y: self.box_y,
                padding: self.padding,
                k: self.k,
                angle: self.angle,
            }),
            None => GridPlan::Lattice {
                nx: self.nx.unwrap_or(7),
                ny: self.ny,
                borderwidth: self.borderwidth,
            },
        }
    }
}

pub fn run(args: &GridArgs) -> Result<(), Box<dyn Error>> {
    let plan = args.plan();
    let (grid, summary) =
        build_offset_grid(&plan, args.radius).map_err(|err| Box::new(err) as Box<dyn Error>)?;
    let report = GridReport {
        plan,
        radius: args.radius,
        count: grid.len(),
        max_norm: grid.max_norm(),
        summary,
    };
    println!("{}", render_json(&report)?);
    if let Some(out) = &args.out {
        write_json(out, &grid)?;
    }
    Ok(())
}
