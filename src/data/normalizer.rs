// ============================================================
// Layer 4 — Feature Normalizer
// ============================================================
// Z-score normalization: subtract the mean and divide by the
// sample standard deviation, both computed once over the whole
// training set, per feature channel.
//
// The fitted parameters are serialized into the artifact bundle
// and reloaded by the serving path, so both flows apply the
// exact same transform to a record.
//
// A constant column has zero deviation; its scale is pinned to
// 1.0 so the transform stays finite.

use serde::{Deserialize, Serialize};

use crate::domain::record::{FeatureVector, NUM_FEATURES};

/// Mean and sample standard deviation of one feature channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureStats {
    pub mean: f64,
    pub std:  f64,
}

/// Per-channel z-score parameters, in channel order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Normalizer {
    stats: Vec<FeatureStats>,
}

impl Normalizer {
    /// Fit over the raw feature vectors of the training set.
    pub fn fit(rows: &[FeatureVector]) -> Self {
        let n = rows.len();
        let mut stats = Vec::with_capacity(NUM_FEATURES);

        for channel in 0..NUM_FEATURES {
            let sum: f64 = rows.iter().map(|r| r[channel]).sum();
            let mean = if n > 0 { sum / n as f64 } else { 0.0 };

            // Sample standard deviation (n - 1 denominator)
            let var_sum: f64 = rows
                .iter()
                .map(|r| {
                    let d = r[channel] - mean;
                    d * d
                })
                .sum();
            let std = if n > 1 {
                (var_sum / (n - 1) as f64).sqrt()
            } else {
                0.0
            };

            let std = if std.is_finite() && std > 0.0 { std } else { 1.0 };
            stats.push(FeatureStats { mean, std });
        }

        Self { stats }
    }

    /// Apply the fitted transform to one feature vector.
    pub fn apply(&self, features: FeatureVector) -> FeatureVector {
        let mut out = [0.0; NUM_FEATURES];
        for (channel, value) in features.iter().enumerate() {
            let s = &self.stats[channel];
            out[channel] = (value - s.mean) / s.std;
        }
        out
    }

    pub fn stats(&self) -> &[FeatureStats] {
        &self.stats
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_mean_after_transform() {
        let rows = vec![
            [1.0, 10.0, 100.0, 5.0, 2.0, 0.0],
            [3.0, 20.0, 300.0, 7.0, 4.0, 1.0],
        ];
        let norm = Normalizer::fit(&rows);

        let a = norm.apply(rows[0]);
        let b = norm.apply(rows[1]);
        for channel in 0..NUM_FEATURES {
            assert!((a[channel] + b[channel]).abs() < 1e-12);
        }
    }

    #[test]
    fn test_sample_standard_deviation() {
        // Values 2 and 4: mean 3, sample std sqrt(2)
        let rows = vec![
            [2.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            [4.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        ];
        let norm = Normalizer::fit(&rows);
        let s = norm.stats()[0];
        assert!((s.mean - 3.0).abs() < 1e-12);
        assert!((s.std - 2.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_constant_column_stays_finite() {
        let rows = vec![
            [5.0, 1.0, 0.0, 0.0, 0.0, 0.0],
            [5.0, 2.0, 0.0, 0.0, 0.0, 0.0],
        ];
        let norm = Normalizer::fit(&rows);
        let out = norm.apply(rows[0]);
        assert!(out.iter().all(|v| v.is_finite()));
        assert_eq!(out[0], 0.0);
    }

    #[test]
    fn test_survives_serde_round_trip() {
        let rows = vec![
            [1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
            [2.0, 4.0, 6.0, 8.0, 10.0, 12.0],
        ];
        let norm = Normalizer::fit(&rows);
        let json = serde_json::to_string(&norm).unwrap();
        let back: Normalizer = serde_json::from_str(&json).unwrap();
        assert_eq!(norm, back);
    }
}
