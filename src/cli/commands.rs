// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands: `train`, `predict`, `serve`
// and all their configurable flags.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};

use crate::application::train_use_case::TrainConfig;
use crate::domain::record::MiningRecord;
use crate::server::ServeConfig;

/// The top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the risk classifier on a mining dataset CSV
    Train(TrainArgs),

    /// Score a single site record against a trained artifact bundle
    Predict(PredictArgs),

    /// Serve predictions over HTTP
    Serve(ServeArgs),
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Path to the dataset CSV
    #[arg(long, default_value = "data/dataset.csv")]
    pub csv: String,

    /// Directory for the trained artifact bundle
    #[arg(long, default_value = "artifacts")]
    pub artifact_dir: String,

    /// Edge length of the raster (G x G cells)
    #[arg(long, default_value_t = 64)]
    pub grid_size: usize,

    /// Number of full passes over the rasterized site
    #[arg(long, default_value_t = 500)]
    pub epochs: usize,

    /// Fixed Adam learning rate
    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// This is the boundary between Layer 1 and Layer 2 —
/// the application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            csv_path:     a.csv,
            artifact_dir: a.artifact_dir,
            grid_size:    a.grid_size,
            epochs:       a.epochs,
            lr:           a.lr,
        }
    }
}

/// All arguments for the `predict` command — one full site record
/// as flags.
#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Directory holding the trained artifact bundle
    #[arg(long, default_value = "artifacts")]
    pub artifact_dir: String,

    /// Easting in meters
    #[arg(long)]
    pub x: f64,

    /// Northing in meters
    #[arg(long)]
    pub y: f64,

    /// Elevation in meters
    #[arg(long)]
    pub z: f64,

    /// Rock formation name, e.g. "limestone"
    #[arg(long)]
    pub rock_type: String,

    /// Ore grade in percent
    #[arg(long)]
    pub ore_grade: f64,

    /// Block tonnage in tonnes
    #[arg(long)]
    pub tonnage: f64,

    /// Ore value per tonne
    #[arg(long)]
    pub ore_value: f64,

    /// Cost of extracting the block
    #[arg(long)]
    pub mining_cost: f64,

    /// Cost of processing the extracted ore
    #[arg(long)]
    pub processing_cost: f64,
}

impl PredictArgs {
    pub fn record(&self) -> MiningRecord {
        MiningRecord {
            x:               self.x,
            y:               self.y,
            z:               self.z,
            rock_type:       self.rock_type.clone(),
            ore_grade:       self.ore_grade,
            tonnage:         self.tonnage,
            ore_value:       self.ore_value,
            mining_cost:     self.mining_cost,
            processing_cost: self.processing_cost,
            target:          None,
        }
    }
}

/// All arguments for the `serve` command
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Directory holding the trained artifact bundle
    #[arg(long, default_value = "artifacts")]
    pub artifact_dir: String,

    /// TCP port to listen on
    #[arg(long, default_value_t = 8080)]
    pub port: u16,
}

impl From<ServeArgs> for ServeConfig {
    fn from(a: ServeArgs) -> Self {
        ServeConfig {
            artifact_dir: a.artifact_dir,
            port:         a.port,
        }
    }
}
