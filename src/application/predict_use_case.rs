// ============================================================
// Layer 2 — PredictUseCase
// ============================================================
// One-off local prediction for the CLI: build the inference
// handle from the artifact bundle, score a single record, and
// hand the result back for printing. No HTTP, no explanation
// call.

use anyhow::Result;

use crate::domain::record::MiningRecord;
use crate::domain::risk::Prediction;
use crate::infra::artifact::ArtifactStore;
use crate::ml::inferencer::Inferencer;

pub struct PredictUseCase {
    inferencer: Inferencer,
}

impl PredictUseCase {
    pub fn new(artifact_dir: &str) -> Result<Self> {
        let store = ArtifactStore::new(artifact_dir);
        let inferencer = Inferencer::from_artifacts(&store)?;
        Ok(Self { inferencer })
    }

    pub fn predict(&self, record: &MiningRecord) -> Result<Prediction> {
        self.inferencer.predict(record)
    }
}
