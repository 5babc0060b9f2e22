// ============================================================
// Layer 3 — Mining Record Domain Type
// ============================================================
// One surveyed block of the mine site. Loaded from the dataset
// CSV for training, or built from an HTTP request body when
// serving. Immutable once constructed — every record produces
// exactly one raster cell downstream.
//
// Reference: Rust Book §5 (Structs and Methods)

use serde::{Deserialize, Serialize};

/// Number of feature channels fed to the classifier.
pub const NUM_FEATURES: usize = 6;

/// Channel order is fixed and shared by training and serving.
/// The rock type travels as its encoded integer code, z-scored
/// together with the numeric features.
pub const FEATURE_NAMES: [&str; NUM_FEATURES] = [
    "ore_grade",
    "tonnage",
    "ore_value",
    "mining_cost",
    "processing_cost",
    "rock_type",
];

/// One record's feature values in [`FEATURE_NAMES`] order.
pub type FeatureVector = [f64; NUM_FEATURES];

/// A single surveyed mining block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MiningRecord {
    /// Easting in meters — spatial only, never a feature channel
    pub x: f64,

    /// Northing in meters — spatial only, never a feature channel
    pub y: f64,

    /// Elevation in meters
    pub z: f64,

    /// Rock formation name, e.g. "granite" or "limestone"
    pub rock_type: String,

    /// Ore grade in percent
    pub ore_grade: f64,

    /// Block tonnage in tonnes
    pub tonnage: f64,

    /// Ore value per tonne
    pub ore_value: f64,

    /// Cost of extracting the block
    pub mining_cost: f64,

    /// Cost of processing the extracted ore
    pub processing_cost: f64,

    /// Ground-truth binary label (0 = safe, 1 = risk).
    /// Present on training records, absent when serving.
    pub target: Option<u8>,
}

impl MiningRecord {
    /// Assemble the raw (un-normalized) feature vector for this
    /// record, with the rock type already encoded to its integer
    /// code by the caller.
    pub fn feature_vector(&self, rock_type_code: f64) -> FeatureVector {
        [
            self.ore_grade,
            self.tonnage,
            self.ore_value,
            self.mining_cost,
            self.processing_cost,
            rock_type_code,
        ]
    }

    /// Ground-truth label as a loss-ready integer.
    pub fn label(&self) -> Option<i64> {
        self.target.map(i64::from)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> MiningRecord {
        MiningRecord {
            x: 500.0,
            y: 400.0,
            z: 50.0,
            rock_type: "limestone".to_string(),
            ore_grade: 35.0,
            tonnage: 1200.0,
            ore_value: 50.0,
            mining_cost: 30.0,
            processing_cost: 15.0,
            target: Some(1),
        }
    }

    #[test]
    fn test_feature_vector_order_matches_channel_layout() {
        let v = record().feature_vector(2.0);
        assert_eq!(v, [35.0, 1200.0, 50.0, 30.0, 15.0, 2.0]);
        assert_eq!(v.len(), NUM_FEATURES);
    }

    #[test]
    fn test_label_conversion() {
        assert_eq!(record().label(), Some(1));
        let mut r = record();
        r.target = None;
        assert_eq!(r.label(), None);
    }
}
