// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The seams of the system. By programming against traits instead
// of concrete types, implementations can be swapped without
// touching the layers that use them:
//   - CsvLoader implements RecordSource
//   - LlmExplainer implements Explainer
//   - test doubles implement either without I/O
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

use crate::domain::record::MiningRecord;
use crate::domain::risk::Prediction;

// ─── RecordSource ─────────────────────────────────────────────────────────────
/// Any component that can produce the training records.
///
/// Implementations:
///   - CsvLoader → reads the dataset CSV from disk
pub trait RecordSource {
    /// Load all available records from this source.
    fn load_all(&self) -> Result<Vec<MiningRecord>>;
}

// ─── Explainer ────────────────────────────────────────────────────────────────
/// Failure of the external text-generation service. Callers are
/// expected to degrade to a placeholder string rather than fail
/// the surrounding response.
#[derive(Debug, Error)]
pub enum ExplainError {
    /// The service could not be reached or rejected the request.
    #[error("explanation service unavailable: {0}")]
    Service(String),

    /// The service answered but the payload had no usable text.
    #[error("explanation service returned a malformed response")]
    Malformed,
}

/// Any component that can turn a numeric prediction into a prose
/// justification for mining engineers.
///
/// Implementations:
///   - LlmExplainer → OpenAI-compatible chat-completions API
#[async_trait]
pub trait Explainer: Send + Sync {
    /// Produce a narrative explanation for `prediction` in the
    /// context of the original `record`.
    async fn explain(
        &self,
        prediction: &Prediction,
        record:     &MiningRecord,
    ) -> Result<String, ExplainError>;
}
