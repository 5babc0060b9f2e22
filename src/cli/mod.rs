// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction, parsed with `clap`.
// All business logic is delegated to Layer 2 (application) or
// the serving layer.
//
// Three commands are supported:
//   1. `train`   — trains the classifier on a dataset CSV
//   2. `predict` — scores one record against saved artifacts
//   3. `serve`   — exposes predictions over HTTP
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, PredictArgs, ServeArgs, TrainArgs};

/// The main CLI struct — clap reads the fields and generates
/// argument parsing code automatically via the Parser derive macro.
#[derive(Parser, Debug)]
#[command(
    name = "rockfall-risk",
    version = "0.1.0",
    about = "Train a convolutional rockfall-risk classifier on gridded mining data, then serve predictions."
)]
pub struct Cli {
    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    /// This keeps the CLI layer thin — it only routes, never computes.
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)   => Self::run_train(args),
            Commands::Predict(args) => Self::run_predict(args),
            Commands::Serve(args)   => Self::run_serve(args).await,
        }
    }

    /// Handles the `train` subcommand.
    fn run_train(args: TrainArgs) -> Result<()> {
        use crate::application::train_use_case::TrainUseCase;

        tracing::info!("Starting training on dataset: {}", args.csv);

        let use_case = TrainUseCase::new(args.into());
        use_case.execute()?;

        println!("Training complete. Artifact bundle saved.");
        Ok(())
    }

    /// Handles the `predict` subcommand.
    fn run_predict(args: PredictArgs) -> Result<()> {
        use crate::application::predict_use_case::PredictUseCase;

        let use_case = PredictUseCase::new(&args.artifact_dir)?;
        let prediction = use_case.predict(&args.record())?;

        println!("\nRisk level: {}", prediction.risk_level);
        println!("Class:      {}", prediction.class_label());
        println!("Confidence: {:.2}%", prediction.confidence * 100.0);
        println!(
            "Grid cell:  ({}, {})",
            prediction.grid_position.x, prediction.grid_position.y,
        );
        Ok(())
    }

    /// Handles the `serve` subcommand.
    async fn run_serve(args: ServeArgs) -> Result<()> {
        crate::server::run_server(args.into()).await
    }
}
