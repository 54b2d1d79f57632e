//! Planner settings and their validation.

use serde::{Deserialize, Serialize};

use seekscan_core::errors::{ErrorInfo, SeekError};
use seekscan_geom::TileSpec;

/// How the shared offset grid is generated at planning time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GridPlan {
    /// Plain lattice over the hole with a fixed relative border.
    Lattice {
        /// Lattice columns.
        #[serde(default = "default_lattice_n")]
        nx: usize,
        /// Lattice rows; `nx` when absent.
        #[serde(default)]
        ny: Option<usize>,
        /// Fraction of the radius kept free along the rim.
        #[serde(default = "default_lattice_border")]
        borderwidth: f64,
    },
    /// Tiles sized from the camera field of view.
    Tiled(TileSpec),
}

fn default_lattice_n() -> usize {
    7
}

fn default_lattice_border() -> f64 {
    0.8
}

impl Default for GridPlan {
    fn default() -> Self {
        GridPlan::Lattice {
            nx: default_lattice_n(),
            ny: None,
            borderwidth: default_lattice_border(),
        }
    }
}

/// Planner settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanConfig {
    /// Grid generation strategy.
    #[serde(default)]
    pub grid: GridPlan,
    /// Index inside each file group whose position does not belong to the rim
    /// triangle. Groups hold four files when set, three otherwise.
    #[serde(default)]
    pub reference_index: Option<usize>,
    /// Seed for the synthetic circle used when the stage reports the origin.
    #[serde(default = "default_simulation_seed")]
    pub simulation_seed: u64,
}

fn default_simulation_seed() -> u64 {
    0x5EED_CAFE
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            grid: GridPlan::default(),
            reference_index: None,
            simulation_seed: default_simulation_seed(),
        }
    }
}

impl PlanConfig {
    /// Number of observations that make up one hole.
    pub fn group_size(&self) -> usize {
        if self.reference_index.is_some() {
            4
        } else {
            3
        }
    }

    /// Checks the settings once before planning.
    pub fn validate(&self) -> Result<(), SeekError> {
        if let Some(index) = self.reference_index {
            if index >= 4 {
                return Err(SeekError::Config(
                    ErrorInfo::new("plan-reference-index", "reference index outside the group")
                        .with_context("reference_index", index.to_string()),
                ));
            }
        }
        if let GridPlan::Lattice {
            nx, borderwidth, ..
        } = &self.grid
        {
            if *nx == 0 || !borderwidth.is_finite() {
                return Err(SeekError::config(
                    "plan-lattice",
                    "lattice needs at least one column and a finite border",
                ));
            }
        }
        Ok(())
    }
}
