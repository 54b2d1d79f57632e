use std::error::Error;

use clap::{Parser, Subcommand};

use commands::{
    goto_hole::{self, GotoHoleArgs},
    grid::{self, GridArgs},
    map_holes::{self, MapHolesArgs},
    prepare::{self, PrepareArgs},
    reconcile::{self, ReconcileArgs},
    run::{self, RunArgs},
    status::{self, StatusArgs},
};

mod commands;
mod ledger;
mod operator;
mod sim;

#[derive(Parser, Debug)]
#[command(name = "seekscan", about = "Seek-and-image grid planning and scan execution")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the offset grid generated for a hole radius.
    Grid(GridArgs),
    /// Build the dense hole map from survey detections.
    MapHoles(MapHolesArgs),
    /// Fit holes and persist a new experiment.
    Prepare(PrepareArgs),
    /// Align the experiment with the dense hole map.
    Reconcile(ReconcileArgs),
    /// Execute the scan over the stored experiment.
    Run(RunArgs),
    /// Report which inputs are in place for a scan.
    Status(StatusArgs),
    /// Move the stage to a stored hole.
    GotoHole(GotoHoleArgs),
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Grid(args) => grid::run(&args),
        Command::MapHoles(args) => map_holes::run(&args),
        Command::Prepare(args) => prepare::run(&args),
        Command::Reconcile(args) => reconcile::run(&args),
        Command::Run(args) => run::run(&args),
        Command::Status(args) => status::run(&args),
        Command::GotoHole(args) => goto_hole::run(&args),
    }
}
