// ============================================================
// Layer 4 — Rock Type Encoder
// ============================================================
// Maps rock formation names to small integer codes. The mapping
// is fixed at training time from the observed category set —
// sorted unique names, codes assigned in order — and persisted
// beside the weights so serving applies the identical encoding.
//
// Names are lowercased and trimmed before lookup, so "Granite"
// and "granite" share a code. A name never seen during training
// maps to code 0 with a logged warning.
//
// Reference: Rust Book §8 (Collections)

use serde::{Deserialize, Serialize};

use crate::domain::record::MiningRecord;

/// Categorical encoding for rock formation names.
/// Code = index into the sorted category list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RockTypeEncoder {
    categories: Vec<String>,
}

impl RockTypeEncoder {
    /// Fix the encoding from the training records: normalize each
    /// name, collect the unique set, sort it, and assign codes in
    /// order.
    pub fn fit(records: &[MiningRecord]) -> Self {
        let mut categories: Vec<String> = records
            .iter()
            .map(|r| normalize(&r.rock_type))
            .collect();
        categories.sort();
        categories.dedup();

        tracing::debug!("Fixed rock-type encoding over {} categories", categories.len());
        Self { categories }
    }

    /// Encode one rock type name.
    /// Unknown names fall back to code 0.
    pub fn encode(&self, rock_type: &str) -> usize {
        let name = normalize(rock_type);
        match self.categories.binary_search(&name) {
            Ok(code) => code,
            Err(_) => {
                tracing::warn!(
                    "Rock type '{}' was not seen during training — encoding as 0",
                    rock_type
                );
                0
            }
        }
    }

    /// All known category names in code order.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// (name, code) pairs for reporting the encoding map.
    pub fn encoding_map(&self) -> Vec<(String, usize)> {
        self.categories
            .iter()
            .enumerate()
            .map(|(code, name)| (name.clone(), code))
            .collect()
    }
}

fn normalize(rock_type: &str) -> String {
    rock_type.trim().to_lowercase()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn record(rock_type: &str) -> MiningRecord {
        MiningRecord {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            rock_type: rock_type.to_string(),
            ore_grade: 10.0,
            tonnage: 100.0,
            ore_value: 10.0,
            mining_cost: 5.0,
            processing_cost: 2.0,
            target: Some(0),
        }
    }

    #[test]
    fn test_codes_follow_sorted_order() {
        let records = vec![record("shale"), record("granite"), record("limestone")];
        let enc = RockTypeEncoder::fit(&records);
        assert_eq!(enc.encode("granite"),   0);
        assert_eq!(enc.encode("limestone"), 1);
        assert_eq!(enc.encode("shale"),     2);
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let enc = RockTypeEncoder::fit(&[record("Granite"), record("Limestone")]);
        assert_eq!(enc.encode("granite"), enc.encode("  GRANITE "));
        assert_eq!(enc.categories(), &["granite".to_string(), "limestone".to_string()]);
    }

    #[test]
    fn test_duplicates_collapse() {
        let enc = RockTypeEncoder::fit(&[record("basalt"), record("basalt"), record("slate")]);
        assert_eq!(enc.categories().len(), 2);
    }

    #[test]
    fn test_unknown_maps_to_zero() {
        let enc = RockTypeEncoder::fit(&[record("granite"), record("shale")]);
        assert_eq!(enc.encode("obsidian"), 0);
    }

    #[test]
    fn test_survives_serde_round_trip() {
        let enc = RockTypeEncoder::fit(&[record("granite"), record("shale")]);
        let json = serde_json::to_string(&enc).unwrap();
        let back: RockTypeEncoder = serde_json::from_str(&json).unwrap();
        assert_eq!(enc, back);
    }
}
