// ============================================================
// Layer 3 — Risk Level Derivation
// ============================================================
// The network emits two classes per grid cell (safe / risk).
// Operations teams work with four severity buckets, so the
// binary output is widened by confidence thresholds:
//
//   class = risk, confidence > 0.85 → Critical
//   class = risk, confidence > 0.65 → Danger
//   class = risk, confidence > 0.50 → Normal
//   anything else                   → Safe
//
// Pure functions of (class, confidence) — no hidden state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Output class index for "safe" cells.
pub const CLASS_SAFE: usize = 0;

/// Output class index for "risk" cells.
pub const CLASS_RISK: usize = 1;

/// Four-level severity bucket derived from the binary prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Critical,
    Danger,
    Normal,
    Safe,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Critical => "Critical",
            RiskLevel::Danger   => "Danger",
            RiskLevel::Normal   => "Normal",
            RiskLevel::Safe     => "Safe",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bucket a binary class prediction into a four-level risk label.
///
/// Thresholds are strict: a risk cell at exactly 0.85 is Danger,
/// and one at exactly 0.50 falls through to Safe.
pub fn derive_risk_level(predicted_class: usize, confidence: f32) -> RiskLevel {
    if predicted_class != CLASS_RISK {
        return RiskLevel::Safe;
    }
    if confidence > 0.85 {
        RiskLevel::Critical
    } else if confidence > 0.65 {
        RiskLevel::Danger
    } else if confidence > 0.5 {
        RiskLevel::Normal
    } else {
        RiskLevel::Safe
    }
}

/// A cell index into the raster, `x` = column, `y` = row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridPosition {
    pub x: usize,
    pub y: usize,
}

/// The outcome of scoring one record. Ephemeral — computed per
/// request and never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub risk_level:      RiskLevel,
    pub predicted_class: usize,
    pub confidence:      f32,
    pub grid_position:   GridPosition,
}

impl Prediction {
    /// The raw binary class as a display label.
    pub fn class_label(&self) -> &'static str {
        if self.predicted_class == CLASS_RISK { "Risk" } else { "Safe" }
    }

    pub fn is_risk(&self) -> bool {
        self.predicted_class == CLASS_RISK
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_class_buckets_by_confidence() {
        assert_eq!(derive_risk_level(CLASS_RISK, 0.9),  RiskLevel::Critical);
        assert_eq!(derive_risk_level(CLASS_RISK, 0.7),  RiskLevel::Danger);
        assert_eq!(derive_risk_level(CLASS_RISK, 0.55), RiskLevel::Normal);
    }

    #[test]
    fn test_safe_class_is_always_safe() {
        assert_eq!(derive_risk_level(CLASS_SAFE, 0.99), RiskLevel::Safe);
        assert_eq!(derive_risk_level(CLASS_SAFE, 0.51), RiskLevel::Safe);
        assert_eq!(derive_risk_level(CLASS_SAFE, 0.0),  RiskLevel::Safe);
    }

    #[test]
    fn test_thresholds_are_strict() {
        // Exactly at a threshold falls into the next bucket down
        assert_eq!(derive_risk_level(CLASS_RISK, 0.85), RiskLevel::Danger);
        assert_eq!(derive_risk_level(CLASS_RISK, 0.65), RiskLevel::Normal);
        assert_eq!(derive_risk_level(CLASS_RISK, 0.5),  RiskLevel::Safe);
    }

    #[test]
    fn test_class_label() {
        let p = Prediction {
            risk_level:      RiskLevel::Danger,
            predicted_class: CLASS_RISK,
            confidence:      0.7,
            grid_position:   GridPosition { x: 3, y: 4 },
        };
        assert_eq!(p.class_label(), "Risk");
        assert!(p.is_risk());
    }
}
