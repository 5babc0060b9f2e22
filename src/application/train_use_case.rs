// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load the dataset CSV        (Layer 4 - data)
//   Step 2: Fix the rock-type encoding  (Layer 4 - data)
//   Step 3: Fit the normalizer          (Layer 4 - data)
//   Step 4: Rasterize onto the grid     (Layer 4 - data)
//   Step 5: Persist pipeline parameters (Layer 6 - infra)
//   Step 6: Run the training loop       (Layer 5 - ml)
//   Step 7: Evaluate and report         (Layer 5 - ml)
//
// Reference: Burn Book §5 (Training)

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::data::{
    dataset::{GridDataset, GridSample},
    encoder::RockTypeEncoder,
    grid::{GridBounds, GridRasterizer},
    loader::CsvLoader,
    normalizer::Normalizer,
};
use crate::domain::record::{FeatureVector, NUM_FEATURES};
use crate::domain::traits::RecordSource;
use crate::infra::artifact::ArtifactStore;
use crate::ml::evaluator;
use crate::ml::model::RiskCnnConfig;
use crate::ml::trainer::run_training;

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a training run. Serialisable so it can
// be saved into the artifact bundle and reloaded for inference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub csv_path:     String,
    pub artifact_dir: String,
    pub grid_size:    usize,
    pub epochs:       usize,
    pub lr:           f64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            csv_path:     "data/dataset.csv".to_string(),
            artifact_dir: "artifacts".to_string(),
            grid_size:    64,
            epochs:       500,
            lr:           1e-3,
        }
    }
}

impl TrainConfig {
    /// Architecture matching this run's grid and channel layout.
    pub fn model_config(&self) -> RiskCnnConfig {
        RiskCnnConfig::new(NUM_FEATURES, self.grid_size)
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
/// Owns the config and runs the full training pipeline.
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end.
    pub fn execute(&self) -> Result<()> {
        let cfg = &self.config;

        // ── Step 1: Load the dataset ──────────────────────────────────────────
        tracing::info!("Loading dataset from '{}'", cfg.csv_path);
        let loader  = CsvLoader::new(&cfg.csv_path);
        let records = loader.load_all()?;
        if records.is_empty() {
            bail!("dataset '{}' contains no records", cfg.csv_path);
        }

        // ── Step 2: Fix the categorical encoding ──────────────────────────────
        let encoder = RockTypeEncoder::fit(&records);
        tracing::info!("Rock-type encoding fixed: {:?}", encoder.categories());

        // ── Step 3: Fit the normalizer over the encoded features ──────────────
        let rows: Vec<FeatureVector> = records
            .iter()
            .map(|r| r.feature_vector(encoder.encode(&r.rock_type) as f64))
            .collect();
        let normalizer = Normalizer::fit(&rows);

        // ── Step 4: Rasterize the site onto the grid ──────────────────────────
        let bounds = GridBounds::from_records(&records)?;
        let rasterizer = GridRasterizer::new(bounds, cfg.grid_size);
        let (features, targets) = rasterizer.rasterize(&records, &encoder, &normalizer);
        tracing::info!(
            "Rasterized {} records onto a {}x{} grid ({} channels)",
            records.len(), cfg.grid_size, cfg.grid_size, NUM_FEATURES,
        );

        // ── Step 5: Persist the pipeline parameters ───────────────────────────
        // Serving replays this exact preprocessing, so everything
        // is written before training starts.
        let artifacts = ArtifactStore::new(&cfg.artifact_dir);
        artifacts.save_config(cfg)?;
        artifacts.save_encoder(&encoder)?;
        artifacts.save_normalizer(&normalizer)?;
        artifacts.save_bounds(&bounds)?;

        // ── Step 6: Run the training loop (Layer 5) ───────────────────────────
        let sample  = GridSample::new(features, targets);
        let dataset = GridDataset::new(vec![sample.clone()]);
        run_training(cfg, dataset, &artifacts)?;

        // ── Step 7: Evaluate against the training grid ────────────────────────
        // Reload through the artifact store so the report scores
        // exactly what serving will load.
        type EvalBackend = burn::backend::NdArray;
        let device = Default::default();
        let model = artifacts.load_model::<EvalBackend>(&cfg.model_config(), &device)?;
        let report = evaluator::evaluate(&model, &sample, &device)?;
        println!("\n{}", report.format());

        Ok(())
    }
}
