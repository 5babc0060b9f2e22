// ============================================================
// Layer 1 — HTTP Serving Layer
// ============================================================
// A single-purpose REST wrapper over the inference handle:
//
//   POST /predict        — full prediction with explanation
//   POST /predict-simple — risk label + confidence only
//   GET  /health         — liveness + artifact status
//   GET  /rock-types     — supported categories and codes
//
// The loaded model, encoder, and normalizer are immutable after
// startup, shared across handlers behind Arc. Requests are
// validated before any computation; validation failures map to
// 400, everything unexpected to an opaque 500. A failed
// explanation call never fails the response — it degrades to an
// inline error string.

pub mod explain;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::{net::SocketAddr, sync::Arc};
use thiserror::Error;

use crate::domain::record::MiningRecord;
use crate::domain::traits::Explainer;
use crate::infra::artifact::ArtifactStore;
use crate::ml::inferencer::Inferencer;
use crate::server::explain::LlmExplainer;

// ---------- Server configuration ----------

#[derive(Debug, Clone)]
pub struct ServeConfig {
    pub artifact_dir: String,
    pub port:         u16,
}

// ---------- Request/Response types ----------

/// Incoming prediction request. Field names match the dataset
/// headers, with the unit-annotated originals accepted as
/// aliases.
#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    #[serde(rename = "X")]
    pub x: f64,

    #[serde(rename = "Y")]
    pub y: f64,

    #[serde(rename = "Z")]
    pub z: f64,

    #[serde(rename = "Rock_Type")]
    pub rock_type: String,

    #[serde(rename = "Ore_Grade_percent", alias = "Ore_Grade (%)")]
    pub ore_grade: f64,

    #[serde(rename = "Tonnage")]
    pub tonnage: f64,

    #[serde(rename = "Ore_Value_per_tonne", alias = "Ore_Value (¥/tonne)")]
    pub ore_value: f64,

    #[serde(rename = "Mining_Cost", alias = "Mining_Cost (¥)")]
    pub mining_cost: f64,

    #[serde(rename = "Processing_Cost", alias = "Processing_Cost (¥)")]
    pub processing_cost: f64,
}

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("Rock_Type must be a non-empty string")]
    EmptyRockType,

    #[error("Ore grade must be between 0 and 100")]
    OreGradeOutOfRange,

    #[error("Tonnage must be positive")]
    NonPositiveTonnage,
}

impl PredictRequest {
    /// Reject out-of-range fields before any computation.
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.rock_type.trim().is_empty() {
            return Err(RequestError::EmptyRockType);
        }
        if !(0.0..=100.0).contains(&self.ore_grade) {
            return Err(RequestError::OreGradeOutOfRange);
        }
        if self.tonnage <= 0.0 {
            return Err(RequestError::NonPositiveTonnage);
        }
        Ok(())
    }

    pub fn into_record(self) -> MiningRecord {
        MiningRecord {
            x:               self.x,
            y:               self.y,
            z:               self.z,
            rock_type:       self.rock_type,
            ore_grade:       self.ore_grade,
            tonnage:         self.tonnage,
            ore_value:       self.ore_value,
            mining_cost:     self.mining_cost,
            processing_cost: self.processing_cost,
            target:          None,
        }
    }
}

// ---------- Server state ----------

#[derive(Clone)]
pub struct AppState {
    inferencer: Arc<Inferencer>,
    explainer:  Arc<dyn Explainer>,
}

type HandlerError = (StatusCode, Json<Value>);

fn bad_request(message: String) -> HandlerError {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
}

fn internal_error(message: String) -> HandlerError {
    (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": message })))
}

// ---------- Handlers ----------

async fn predict(
    State(state): State<AppState>,
    Json(request): Json<PredictRequest>,
) -> Result<Json<Value>, HandlerError> {
    request.validate().map_err(|e| bad_request(e.to_string()))?;
    let record = request.into_record();

    let prediction = state
        .inferencer
        .predict(&record)
        .map_err(|e| internal_error(format!("Prediction failed: {e}")))?;

    // Degrade, never fail: a broken explanation service still
    // returns a successful prediction response
    let explanation = match state.explainer.explain(&prediction, &record).await {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!("Explanation call failed: {e}");
            format!("Error generating explanation: {e}")
        }
    };

    let key_factors = explain::key_factors(&record, &prediction);
    let recommendations = explain::safety_recommendations(&prediction);
    let rock_type_encoded = state.inferencer.encoder().encode(&record.rock_type);

    Ok(Json(json!({
        "success": true,
        "prediction": {
            "risk_label": prediction.risk_level.as_str(),
            "confidence": prediction.confidence,
            "grid_position": {
                "x": prediction.grid_position.x,
                "y": prediction.grid_position.y,
            },
        },
        "explanation": explanation,
        "key_factors": key_factors,
        "safety_recommendations": recommendations,
        "input_summary": {
            "location": format!("({}, {}, {})", record.x, record.y, record.z),
            "ore_grade": format!("{}%", record.ore_grade),
            "tonnage": format!("{} tonnes", record.tonnage),
        },
        "metadata": {
            "rock_type_original": record.rock_type,
            "rock_type_encoded": rock_type_encoded,
            "model_version": "1.0",
        },
    })))
}

async fn predict_simple(
    State(state): State<AppState>,
    Json(request): Json<PredictRequest>,
) -> Result<Json<Value>, HandlerError> {
    request.validate().map_err(|e| bad_request(e.to_string()))?;
    let record = request.into_record();

    let prediction = state
        .inferencer
        .predict(&record)
        .map_err(|e| internal_error(format!("Prediction failed: {e}")))?;

    Ok(Json(json!({
        "risk_label": prediction.risk_level.as_str(),
        "confidence": prediction.confidence,
    })))
}

async fn health() -> Json<Value> {
    // The server refuses to start without a loadable artifact
    // bundle, so reaching this handler implies the model is up
    Json(json!({
        "status": "healthy",
        "message": "Rockfall prediction service is running",
        "model_loaded": true,
    }))
}

async fn rock_types(State(state): State<AppState>) -> Json<Value> {
    let encoder = state.inferencer.encoder();
    let encoding_map: serde_json::Map<String, Value> = encoder
        .encoding_map()
        .into_iter()
        .map(|(name, code)| (name, json!(code)))
        .collect();

    Json(json!({
        "supported_rock_types": encoder.categories(),
        "encoding_map": encoding_map,
    }))
}

// ---------- Startup ----------

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/predict", post(predict))
        .route("/predict-simple", post(predict_simple))
        .route("/health", get(health))
        .route("/rock-types", get(rock_types))
        .with_state(state)
}

/// Load the artifact bundle, warm the model, and serve forever.
/// A missing bundle is a startup failure, not a per-request 500.
pub async fn run_server(cfg: ServeConfig) -> anyhow::Result<()> {
    let store = ArtifactStore::new(&cfg.artifact_dir);
    let inferencer = Inferencer::from_artifacts(&store)?;
    inferencer.warmup()?;

    let state = AppState {
        inferencer: Arc::new(inferencer),
        explainer:  Arc::new(LlmExplainer::from_env()),
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state)).await?;
    Ok(())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> PredictRequest {
        PredictRequest {
            x: 500.0,
            y: 400.0,
            z: 50.0,
            rock_type: "limestone".to_string(),
            ore_grade: 35.0,
            tonnage: 1200.0,
            ore_value: 50.0,
            mining_cost: 30.0,
            processing_cost: 15.0,
        }
    }

    #[test]
    fn test_valid_request_passes() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn test_rejects_out_of_range_ore_grade() {
        let mut r = request();
        r.ore_grade = 150.0;
        assert!(matches!(r.validate(), Err(RequestError::OreGradeOutOfRange)));
        r.ore_grade = -1.0;
        assert!(matches!(r.validate(), Err(RequestError::OreGradeOutOfRange)));
    }

    #[test]
    fn test_rejects_non_positive_tonnage() {
        let mut r = request();
        r.tonnage = 0.0;
        assert!(matches!(r.validate(), Err(RequestError::NonPositiveTonnage)));
    }

    #[test]
    fn test_rejects_blank_rock_type() {
        let mut r = request();
        r.rock_type = "   ".to_string();
        assert!(matches!(r.validate(), Err(RequestError::EmptyRockType)));
    }

    #[test]
    fn test_deserializes_dataset_style_aliases() {
        let body = json!({
            "X": 500.0,
            "Y": 400.0,
            "Z": 50.0,
            "Rock_Type": "limestone",
            "Ore_Grade (%)": 35.0,
            "Tonnage": 1200.0,
            "Ore_Value (¥/tonne)": 50.0,
            "Mining_Cost (¥)": 30.0,
            "Processing_Cost (¥)": 15.0,
        });
        let parsed: PredictRequest = serde_json::from_value(body).unwrap();
        assert_eq!(parsed.ore_grade, 35.0);
        assert_eq!(parsed.mining_cost, 30.0);
    }

    #[test]
    fn test_into_record_has_no_target() {
        let record = request().into_record();
        assert_eq!(record.target, None);
        assert_eq!(record.rock_type, "limestone");
    }
}
