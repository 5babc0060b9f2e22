// ============================================================
// Layer 6 — Artifact Store
// ============================================================
// The single handoff between training and serving. One directory
// holds everything inference needs to replay the training-time
// pipeline exactly:
//
//   artifacts/
//     model.mpk          ← weights (MessagePack, full precision)
//     train_config.json  ← grid size + architecture hyperparameters
//     normalizer.json    ← per-channel z-score parameters
//     rock_types.json    ← categorical encoding
//     grid_bounds.json   ← coordinate extent of the training set
//
// The weights alone are not enough: predictions are only
// meaningful when the serving path applies the same encoding,
// normalization, and coordinate mapping as training, so those
// parameters travel with the model.
//
// Weights go through DefaultFileRecorder with full-precision
// settings — CompactRecorder would truncate to f16 and a
// reloaded model would no longer reproduce the training-time
// forward pass bit for bit. Loading fails if the architecture
// does not match the recorded weights.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{DefaultFileRecorder, FullPrecisionSettings},
};
use std::{fs, path::PathBuf};

use crate::application::train_use_case::TrainConfig;
use crate::data::encoder::RockTypeEncoder;
use crate::data::grid::GridBounds;
use crate::data::normalizer::Normalizer;
use crate::ml::model::{RiskCnn, RiskCnnConfig};

const WEIGHTS_FILE:    &str = "model";
const CONFIG_FILE:     &str = "train_config.json";
const NORMALIZER_FILE: &str = "normalizer.json";
const ENCODER_FILE:    &str = "rock_types.json";
const BOUNDS_FILE:     &str = "grid_bounds.json";

/// Manages saving and loading of the trained artifact bundle.
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    /// Create a store rooted at `dir`, creating the directory if
    /// it doesn't already exist.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        fs::create_dir_all(&dir).ok();
        Self { dir }
    }

    /// True once a trained weight file is present.
    pub fn has_weights(&self) -> bool {
        self.dir.join(format!("{WEIGHTS_FILE}.mpk")).exists()
    }

    // ── Weights ───────────────────────────────────────────────────────────────

    /// Write the final model weights, unconditionally overwriting
    /// any previous file.
    pub fn save_model<B: Backend>(&self, model: &RiskCnn<B>) -> Result<()> {
        let path = self.dir.join(WEIGHTS_FILE);
        model
            .clone()
            .save_file(path.clone(), &DefaultFileRecorder::<FullPrecisionSettings>::new())
            .with_context(|| format!("Failed to save weights to '{}'", path.display()))?;
        tracing::debug!("Saved model weights to '{}'", path.display());
        Ok(())
    }

    /// Rebuild the architecture from `config` and restore the
    /// saved weights into it.
    pub fn load_model<B: Backend>(
        &self,
        config: &RiskCnnConfig,
        device: &B::Device,
    ) -> Result<RiskCnn<B>> {
        let path = self.dir.join(WEIGHTS_FILE);
        let model: RiskCnn<B> = config.init(device);
        model
            .load_file(path.clone(), &DefaultFileRecorder::<FullPrecisionSettings>::new(), device)
            .with_context(|| {
                format!(
                    "Cannot load weights from '{}'. Have you run 'train' first?",
                    path.display()
                )
            })
    }

    // ── Training config ───────────────────────────────────────────────────────

    /// Save the training configuration so inference can rebuild
    /// the exact model architecture.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        self.write_json(CONFIG_FILE, cfg)
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        self.read_json(CONFIG_FILE)
    }

    // ── Preprocessing parameters ──────────────────────────────────────────────

    pub fn save_normalizer(&self, normalizer: &Normalizer) -> Result<()> {
        self.write_json(NORMALIZER_FILE, normalizer)
    }

    pub fn load_normalizer(&self) -> Result<Normalizer> {
        self.read_json(NORMALIZER_FILE)
    }

    pub fn save_encoder(&self, encoder: &RockTypeEncoder) -> Result<()> {
        self.write_json(ENCODER_FILE, encoder)
    }

    pub fn load_encoder(&self) -> Result<RockTypeEncoder> {
        self.read_json(ENCODER_FILE)
    }

    pub fn save_bounds(&self, bounds: &GridBounds) -> Result<()> {
        self.write_json(BOUNDS_FILE, bounds)
    }

    pub fn load_bounds(&self) -> Result<GridBounds> {
        self.read_json(BOUNDS_FILE)
    }

    // ── JSON plumbing ─────────────────────────────────────────────────────────

    fn write_json<T: serde::Serialize>(&self, name: &str, value: &T) -> Result<()> {
        let path = self.dir.join(name);
        let json = serde_json::to_string_pretty(value)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write '{}'", path.display()))?;
        tracing::debug!("Saved '{}'", path.display());
        Ok(())
    }

    fn read_json<T: serde::de::DeserializeOwned>(&self, name: &str) -> Result<T> {
        let path = self.dir.join(name);
        let json = fs::read_to_string(&path).with_context(|| {
            format!(
                "Cannot read '{}'. Make sure you have run 'train' before serving.",
                path.display()
            )
        })?;
        Ok(serde_json::from_str(&json)?)
    }
}
