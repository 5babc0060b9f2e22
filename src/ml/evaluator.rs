// ============================================================
// Layer 5 — Evaluation / Reporting
// ============================================================
// Scores the trained model against the rasterized training grid
// (there is no held-out split in this pipeline) and renders a
// text report: per-class precision/recall/F1, the confusion
// matrix, and ROC-AUC over the risk-class probability.
//
// Purely observational — nothing here feeds back into training
// or inference.

use burn::prelude::*;

use crate::data::dataset::GridSample;
use crate::ml::model::{RiskCnn, NUM_CLASSES};

/// Precision/recall/F1 and support for one class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall:    f64,
    pub f1:        f64,
    pub support:   usize,
}

/// Everything the evaluation pass produces.
#[derive(Debug, Clone)]
pub struct EvaluationReport {
    /// confusion[actual][predicted]
    pub confusion: [[usize; NUM_CLASSES]; NUM_CLASSES],
    pub per_class: [ClassMetrics; NUM_CLASSES],
    pub accuracy:  f64,
    /// None when the ground truth contains a single class
    pub roc_auc:   Option<f64>,
}

const CLASS_NAMES: [&str; NUM_CLASSES] = ["Safe", "Risk"];

/// Run the model over the full grid sample and score every cell
/// against its ground-truth label.
pub fn evaluate<B: Backend>(
    model:  &RiskCnn<B>,
    sample: &GridSample,
    device: &B::Device,
) -> anyhow::Result<EvaluationReport> {
    let g = sample.grid_size;
    let input = Tensor::<B, 1>::from_floats(sample.features.as_slice(), device)
        .reshape([1, sample.channels, g, g]);

    let output = model.forward(input);
    let probs: Vec<f32> = output
        .probs
        .into_data()
        .to_vec()
        .map_err(|e| anyhow::anyhow!("cannot read probability tensor: {e:?}"))?;

    // probs layout: [class][y][x] flattened — class 0 block then class 1 block
    let cells = g * g;
    let mut predictions = Vec::with_capacity(cells);
    let mut risk_scores = Vec::with_capacity(cells);
    for cell in 0..cells {
        let p_safe = probs[cell];
        let p_risk = probs[cells + cell];
        predictions.push(if p_risk > p_safe { 1usize } else { 0usize });
        risk_scores.push(p_risk as f64);
    }

    let truth: Vec<usize> = sample.targets.iter().map(|&t| t as usize).collect();
    Ok(score(&truth, &predictions, &risk_scores))
}

/// Score label/prediction/score triples. Split out from the
/// tensor plumbing so the arithmetic is testable directly.
pub fn score(truth: &[usize], predictions: &[usize], risk_scores: &[f64]) -> EvaluationReport {
    let mut confusion = [[0usize; NUM_CLASSES]; NUM_CLASSES];
    for (&t, &p) in truth.iter().zip(predictions) {
        confusion[t][p] += 1;
    }

    let total: usize = truth.len();
    let correct = confusion[0][0] + confusion[1][1];
    let accuracy = if total > 0 { correct as f64 / total as f64 } else { 0.0 };

    let mut per_class = [ClassMetrics { precision: 0.0, recall: 0.0, f1: 0.0, support: 0 }; NUM_CLASSES];
    for class in 0..NUM_CLASSES {
        let tp = confusion[class][class];
        let predicted: usize = (0..NUM_CLASSES).map(|a| confusion[a][class]).sum();
        let actual:    usize = confusion[class].iter().sum();

        let precision = if predicted > 0 { tp as f64 / predicted as f64 } else { 0.0 };
        let recall    = if actual    > 0 { tp as f64 / actual    as f64 } else { 0.0 };
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        per_class[class] = ClassMetrics { precision, recall, f1, support: actual };
    }

    let roc_auc = roc_auc(truth, risk_scores);

    EvaluationReport { confusion, per_class, accuracy, roc_auc }
}

/// Rank-based ROC-AUC (Mann-Whitney U), with averaged ranks for
/// tied scores. Undefined when only one class is present.
fn roc_auc(truth: &[usize], scores: &[f64]) -> Option<f64> {
    let n_pos = truth.iter().filter(|&&t| t == 1).count();
    let n_neg = truth.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return None;
    }

    // Sort indices by score ascending, then assign average ranks
    // across tie groups
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].partial_cmp(&scores[b]).unwrap_or(std::cmp::Ordering::Equal));

    let mut ranks = vec![0.0f64; scores.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        // Ranks are 1-based; ties share the group's mean rank
        let rank = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = rank;
        }
        i = j + 1;
    }

    let rank_sum_pos: f64 = truth
        .iter()
        .zip(&ranks)
        .filter(|(&t, _)| t == 1)
        .map(|(_, &r)| r)
        .sum();

    let u = rank_sum_pos - (n_pos * (n_pos + 1)) as f64 / 2.0;
    Some(u / (n_pos as f64 * n_neg as f64))
}

impl EvaluationReport {
    /// Render the report in the familiar tabular layout.
    pub fn format(&self) -> String {
        let mut out = String::new();

        out.push_str("Classification Report:\n");
        out.push_str(&format!(
            "{:>12} {:>10} {:>10} {:>10} {:>10}\n",
            "", "precision", "recall", "f1-score", "support",
        ));
        for (class, metrics) in self.per_class.iter().enumerate() {
            out.push_str(&format!(
                "{:>12} {:>10.3} {:>10.3} {:>10.3} {:>10}\n",
                CLASS_NAMES[class], metrics.precision, metrics.recall, metrics.f1, metrics.support,
            ));
        }
        out.push_str(&format!("\n{:>12} {:>10.3}\n\n", "accuracy", self.accuracy));

        out.push_str("Confusion Matrix (rows = actual, cols = predicted):\n");
        for row in &self.confusion {
            out.push_str(&format!("{:>8} {:>8}\n", row[0], row[1]));
        }

        match self.roc_auc {
            Some(auc) => out.push_str(&format!("\nROC AUC Score: {:.4}\n", auc)),
            None => out.push_str("\nROC AUC Score: undefined (single-class ground truth)\n"),
        }

        out
    }
}
