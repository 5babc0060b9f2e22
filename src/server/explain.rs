// ============================================================
// Layer 1 — Explanation Service Client
// ============================================================
// Turns a numeric prediction into prose for mining engineers by
// calling an OpenAI-compatible chat-completions endpoint. The
// call is single-shot: no retries, no timeout tuning, and any
// failure is reported through ExplainError so the HTTP layer can
// degrade to a placeholder string instead of failing the
// response.
//
// key_factors() and safety_recommendations() are pure threshold
// rules over the input record and stay local — only the
// narrative paragraph comes from the remote service.

use async_trait::async_trait;
use serde_json::json;

use crate::domain::record::MiningRecord;
use crate::domain::risk::Prediction;
use crate::domain::traits::{ExplainError, Explainer};

const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
const DEFAULT_MODEL:    &str = "openai/gpt-oss-120b";

/// Chat-completions client for prediction explanations.
pub struct LlmExplainer {
    client:   reqwest::Client,
    api_key:  Option<String>,
    base_url: String,
    model:    String,
}

impl LlmExplainer {
    pub fn new(api_key: Option<String>, base_url: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url,
            model,
        }
    }

    /// Configuration from the environment:
    ///   GROQ_API_KEY  — bearer token (absent → every call degrades)
    ///   GROQ_BASE_URL — endpoint override
    ///   GROQ_MODEL    — model override
    pub fn from_env() -> Self {
        let api_key = std::env::var("GROQ_API_KEY").ok().filter(|k| !k.is_empty());
        if api_key.is_none() {
            tracing::warn!("GROQ_API_KEY not set — explanations will be unavailable");
        }
        Self::new(
            api_key,
            std::env::var("GROQ_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            std::env::var("GROQ_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
        )
    }

    fn build_prompt(prediction: &Prediction, record: &MiningRecord) -> String {
        format!(
            "You are a geological expert explaining rockfall risk predictions.\n\
             \n\
             Prediction Result:\n\
             - Risk Level: {level}\n\
             - Confidence: {confidence:.1}%\n\
             \n\
             Site Conditions:\n\
             - Location: X={x}m, Y={y}m, Z={z}m\n\
             - Rock Type: {rock}\n\
             - Ore Grade: {grade}%\n\
             - Tonnage: {tonnage} tonnes\n\
             - Ore Value: {value} per tonne\n\
             - Mining Cost: {mining}\n\
             - Processing Cost: {processing}\n\
             \n\
             Please provide a clear explanation of:\n\
             1. Why this location shows {level_lower} risk\n\
             2. Key factors contributing to this assessment\n\
             3. Recommendations for safety measures\n\
             \n\
             Keep the explanation concise and practical for mining engineers.",
            level       = prediction.risk_level,
            confidence  = prediction.confidence * 100.0,
            x           = record.x,
            y           = record.y,
            z           = record.z,
            rock        = record.rock_type,
            grade       = record.ore_grade,
            tonnage     = record.tonnage,
            value       = record.ore_value,
            mining      = record.mining_cost,
            processing  = record.processing_cost,
            level_lower = prediction.risk_level.as_str().to_lowercase(),
        )
    }
}

#[async_trait]
impl Explainer for LlmExplainer {
    async fn explain(
        &self,
        prediction: &Prediction,
        record:     &MiningRecord,
    ) -> Result<String, ExplainError> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| ExplainError::Service("no API key configured".to_string()))?;

        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "user", "content": Self::build_prompt(prediction, record) }
            ],
            "temperature": 0.3,
            "max_tokens": 500,
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ExplainError::Service(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ExplainError::Service(format!(
                "status {}",
                response.status()
            )));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ExplainError::Service(e.to_string()))?;

        payload["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or(ExplainError::Malformed)
    }
}

// ─── Local assessment rules ───────────────────────────────────────────────────

/// Threshold rules naming the inputs that drove the assessment.
pub fn key_factors(record: &MiningRecord, prediction: &Prediction) -> Vec<String> {
    let mut factors = Vec::new();

    if record.ore_grade > 40.0 {
        factors.push("High ore grade indicates intensive extraction".to_string());
    }
    if record.tonnage > 1000.0 {
        factors.push("Large tonnage suggests significant excavation".to_string());
    }
    if record.z > 100.0 {
        factors.push("High elevation increases gravitational risk".to_string());
    }
    if prediction.confidence > 0.8 {
        factors.push("High model confidence in prediction".to_string());
    }
    if record.mining_cost > record.processing_cost * 2.0 {
        factors.push("High mining costs may indicate challenging conditions".to_string());
    }

    factors
}

/// Fixed recommendation list per assessment outcome.
pub fn safety_recommendations(prediction: &Prediction) -> Vec<String> {
    if prediction.is_risk() {
        vec![
            "Implement continuous monitoring systems".to_string(),
            "Establish exclusion zones around high-risk areas".to_string(),
            "Regular geological surveys and stability assessments".to_string(),
            "Install early warning systems".to_string(),
            "Ensure proper slope management and drainage".to_string(),
        ]
    } else {
        vec![
            "Maintain regular safety inspections".to_string(),
            "Continue monitoring for changing conditions".to_string(),
            "Follow standard safety protocols".to_string(),
            "Document and track site conditions".to_string(),
        ]
    }
}
