// ============================================================
// Layer 4 — Dataset Loader
// ============================================================
// Reads the mining dataset CSV using the csv crate's serde
// integration. Column headers carry units and currency symbols
// ("Ore_Grade (%)", "Ore_Value (¥/tonne)"), so every field is
// renamed explicitly instead of relying on name matching.
//
// A malformed row fails the whole load — training on a silently
// truncated dataset would shift the normalization statistics.
//
// Reference: csv crate documentation
//            Rust Book §9 (Error Handling)

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use serde::Deserialize;
use std::path::PathBuf;

use crate::domain::record::MiningRecord;
use crate::domain::traits::RecordSource;

/// One row of the dataset CSV, named after the file's headers.
#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "X")]
    x: f64,

    #[serde(rename = "Y")]
    y: f64,

    #[serde(rename = "Z")]
    z: f64,

    #[serde(rename = "Rock_Type")]
    rock_type: String,

    #[serde(rename = "Ore_Grade (%)")]
    ore_grade: f64,

    #[serde(rename = "Tonnage")]
    tonnage: f64,

    #[serde(rename = "Ore_Value (¥/tonne)")]
    ore_value: f64,

    #[serde(rename = "Mining_Cost (¥)")]
    mining_cost: f64,

    #[serde(rename = "Processing_Cost (¥)")]
    processing_cost: f64,

    #[serde(rename = "Target")]
    target: u8,
}

impl From<CsvRow> for MiningRecord {
    fn from(r: CsvRow) -> Self {
        MiningRecord {
            x:               r.x,
            y:               r.y,
            z:               r.z,
            rock_type:       r.rock_type,
            ore_grade:       r.ore_grade,
            tonnage:         r.tonnage,
            ore_value:       r.ore_value,
            mining_cost:     r.mining_cost,
            processing_cost: r.processing_cost,
            target:          Some(r.target),
        }
    }
}

/// Loads training records from a dataset CSV file.
/// Implements the RecordSource trait from Layer 3.
pub struct CsvLoader {
    path: PathBuf,
}

impl CsvLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RecordSource for CsvLoader {
    fn load_all(&self) -> Result<Vec<MiningRecord>> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .from_path(&self.path)
            .with_context(|| format!("Cannot open dataset '{}'", self.path.display()))?;

        let mut records = Vec::new();
        for (line, row) in reader.deserialize::<CsvRow>().enumerate() {
            let row = row.with_context(|| {
                format!("Malformed row {} in '{}'", line + 2, self.path.display())
            })?;
            records.push(MiningRecord::from(row));
        }

        tracing::info!("Loaded {} records from '{}'", records.len(), self.path.display());
        Ok(records)
    }
}
