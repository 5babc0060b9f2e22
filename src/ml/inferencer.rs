// ============================================================
// Layer 5 — Inferencer
// ============================================================
// An immutable prediction handle: model weights, the persisted
// rock-type encoder, normalization parameters, and grid bounds,
// all loaded once from the artifact bundle. Every predict() call
// is a pure function of the handle and the record, so repeated
// calls on the same input return identical results.

use anyhow::Result;
use burn::prelude::*;

use crate::data::encoder::RockTypeEncoder;
use crate::data::grid::GridRasterizer;
use crate::data::normalizer::Normalizer;
use crate::domain::record::{MiningRecord, NUM_FEATURES};
use crate::domain::risk::{derive_risk_level, Prediction};
use crate::infra::artifact::ArtifactStore;
use crate::ml::model::{class_and_confidence, RiskCnn};

type InferBackend = burn::backend::NdArray;

pub struct Inferencer {
    model:      RiskCnn<InferBackend>,
    rasterizer: GridRasterizer,
    encoder:    RockTypeEncoder,
    normalizer: Normalizer,
    device:     <InferBackend as Backend>::Device,
}

impl Inferencer {
    /// Load every artifact the serving path needs. Fails with an
    /// actionable message when training has not produced a bundle.
    pub fn from_artifacts(store: &ArtifactStore) -> Result<Self> {
        let device = Default::default();

        let cfg        = store.load_config()?;
        let encoder    = store.load_encoder()?;
        let normalizer = store.load_normalizer()?;
        let bounds     = store.load_bounds()?;
        let model      = store.load_model::<InferBackend>(&cfg.model_config(), &device)?;

        tracing::info!(
            "Model loaded: {}x{} grid, {} rock types",
            cfg.grid_size, cfg.grid_size, encoder.categories().len(),
        );

        Ok(Self {
            model,
            rasterizer: GridRasterizer::new(bounds, cfg.grid_size),
            encoder,
            normalizer,
            device,
        })
    }

    /// Score one record: rasterize it into its own grid cell, run
    /// the forward pass, and read class/confidence at that cell.
    pub fn predict(&self, record: &MiningRecord) -> Result<Prediction> {
        let (grid, pos) = self
            .rasterizer
            .rasterize_one(record, &self.encoder, &self.normalizer);

        let g = grid.grid_size;
        let input = Tensor::<InferBackend, 1>::from_floats(grid.values.as_slice(), &self.device)
            .reshape([1, NUM_FEATURES, g, g]);

        let output = self.model.forward(input);

        // Slice out the two class probabilities at the record's cell
        let cell_probs: Vec<f32> = output
            .probs
            .slice([0..1, 0..2, pos.y..pos.y + 1, pos.x..pos.x + 1])
            .reshape([2])
            .into_data()
            .to_vec()
            .map_err(|e| anyhow::anyhow!("cannot read probability tensor: {e:?}"))?;

        let (predicted_class, confidence) = class_and_confidence(cell_probs[0], cell_probs[1]);
        let risk_level = derive_risk_level(predicted_class, confidence);

        tracing::debug!(
            "Cell ({}, {}) → {} (class={}, confidence={:.4})",
            pos.x, pos.y, risk_level, predicted_class, confidence,
        );

        Ok(Prediction {
            risk_level,
            predicted_class,
            confidence,
            grid_position: pos,
        })
    }

    /// One throwaway forward pass over a zero grid so the first
    /// real request doesn't pay lazy-initialization cost.
    pub fn warmup(&self) -> Result<()> {
        let g = self.rasterizer.grid_size();
        let input = Tensor::<InferBackend, 1>::from_floats(
            vec![0.0f32; NUM_FEATURES * g * g].as_slice(),
            &self.device,
        )
        .reshape([1, NUM_FEATURES, g, g]);
        let _ = self.model.forward(input);
        tracing::info!("warmup forward ok");
        Ok(())
    }

    pub fn encoder(&self) -> &RockTypeEncoder {
        &self.encoder
    }

    pub fn grid_size(&self) -> usize {
        self.rasterizer.grid_size()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::train_use_case::TrainConfig;
    use crate::data::grid::GridBounds;
    use crate::domain::record::FeatureVector;

    fn record(x: f64, y: f64, rock: &str) -> MiningRecord {
        MiningRecord {
            x,
            y,
            z: 50.0,
            rock_type: rock.to_string(),
            ore_grade: 35.0,
            tonnage: 1200.0,
            ore_value: 50.0,
            mining_cost: 30.0,
            processing_cost: 15.0,
            target: Some(1),
        }
    }

    /// Build a complete artifact bundle from an untrained model
    /// so the serving path can be exercised end to end.
    fn seed_artifacts(tag: &str) -> ArtifactStore {
        let dir = std::env::temp_dir().join(format!(
            "rockfall-inferencer-{tag}-{}",
            std::process::id()
        ));
        std::fs::remove_dir_all(&dir).ok();
        let store = ArtifactStore::new(dir);

        let records = vec![
            record(0.0, 0.0, "granite"),
            record(500.0, 400.0, "limestone"),
            record(1000.0, 800.0, "shale"),
        ];
        let encoder = RockTypeEncoder::fit(&records);
        let rows: Vec<FeatureVector> = records
            .iter()
            .map(|r| r.feature_vector(encoder.encode(&r.rock_type) as f64))
            .collect();
        let normalizer = Normalizer::fit(&rows);
        let bounds = GridBounds::from_records(&records).unwrap();

        let cfg = TrainConfig {
            csv_path:     "unused".to_string(),
            artifact_dir: "unused".to_string(),
            grid_size:    16,
            epochs:       1,
            lr:           1e-3,
        };

        let device = Default::default();
        let model: RiskCnn<InferBackend> = cfg.model_config().init(&device);

        store.save_config(&cfg).unwrap();
        store.save_encoder(&encoder).unwrap();
        store.save_normalizer(&normalizer).unwrap();
        store.save_bounds(&bounds).unwrap();
        store.save_model(&model).unwrap();
        store
    }

    #[test]
    fn test_prediction_is_deterministic_across_calls() {
        let store = seed_artifacts("repeat");
        let inferencer = Inferencer::from_artifacts(&store).unwrap();
        let input = record(500.0, 400.0, "limestone");

        let a = inferencer.predict(&input).unwrap();
        let b = inferencer.predict(&input).unwrap();

        assert_eq!(a.risk_level, b.risk_level);
        assert_eq!(a.predicted_class, b.predicted_class);
        assert_eq!(a.confidence.to_bits(), b.confidence.to_bits());
        assert_eq!(a.grid_position, b.grid_position);
    }

    #[test]
    fn test_reloaded_bundle_reproduces_the_same_prediction() {
        let store = seed_artifacts("reload");
        let input = record(500.0, 400.0, "limestone");

        let first  = Inferencer::from_artifacts(&store).unwrap().predict(&input).unwrap();
        let second = Inferencer::from_artifacts(&store).unwrap().predict(&input).unwrap();

        // Fixed weight file + fixed input → exact reproduction
        assert_eq!(first.risk_level, second.risk_level);
        assert_eq!(first.confidence.to_bits(), second.confidence.to_bits());
        assert_eq!(first.grid_position, second.grid_position);
    }

    #[test]
    fn test_confidence_is_a_valid_majority_probability() {
        let store = seed_artifacts("range");
        let inferencer = Inferencer::from_artifacts(&store).unwrap();
        let p = inferencer.predict(&record(500.0, 400.0, "limestone")).unwrap();

        // The reported confidence is the argmax class's softmax
        // probability over two classes
        assert!(p.confidence >= 0.5);
        assert!(p.confidence <= 1.0);
    }

    #[test]
    fn test_grid_position_matches_the_persisted_bounds() {
        let store = seed_artifacts("position");
        let inferencer = Inferencer::from_artifacts(&store).unwrap();

        let corner = inferencer.predict(&record(1000.0, 800.0, "shale")).unwrap();
        assert_eq!(corner.grid_position.x, 15);
        assert_eq!(corner.grid_position.y, 15);

        let origin = inferencer.predict(&record(0.0, 0.0, "granite")).unwrap();
        assert_eq!(origin.grid_position.x, 0);
        assert_eq!(origin.grid_position.y, 0);
    }

    #[test]
    fn test_missing_bundle_fails_loudly() {
        let dir = std::env::temp_dir().join(format!(
            "rockfall-inferencer-empty-{}",
            std::process::id()
        ));
        std::fs::remove_dir_all(&dir).ok();
        let store = ArtifactStore::new(dir);
        assert!(Inferencer::from_artifacts(&store).is_err());
    }
}
