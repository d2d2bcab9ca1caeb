//! Classifier quality metrics against labelled ground truth.

use crate::types::result::{FraudResult, MANUAL_REVIEW_THRESHOLD};
use crate::types::transaction::Transaction;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// A scored prediction reduced to what metrics need
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub transaction_id: String,
    pub fraud_score: f64,
}

impl Prediction {
    pub fn new(transaction_id: impl Into<String>, fraud_score: f64) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            fraud_score,
        }
    }

    /// Predicted fraud at the manual-review threshold
    pub fn is_fraud(&self) -> bool {
        self.fraud_score >= MANUAL_REVIEW_THRESHOLD
    }
}

impl From<&FraudResult> for Prediction {
    fn from(result: &FraudResult) -> Self {
        Self::new(result.transaction_id.clone(), result.fraud_score)
    }
}

/// Ground-truth label for a transaction (1 = abuse)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundTruth {
    pub transaction_id: String,
    pub abuse: u8,
}

impl GroundTruth {
    pub fn new(transaction_id: impl Into<String>, abuse: u8) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            abuse,
        }
    }

    pub fn is_abuse(&self) -> bool {
        self.abuse == 1
    }

    /// Labels of every transaction that carries one
    pub fn from_transactions(transactions: &[Transaction]) -> Vec<GroundTruth> {
        transactions
            .iter()
            .filter_map(|tx| tx.abuse.map(|abuse| GroundTruth::new(tx.transaction_id.clone(), abuse)))
            .collect()
    }
}

/// Confusion matrix and derived scores
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfusionMetrics {
    pub true_positives: usize,
    pub false_positives: usize,
    pub true_negatives: usize,
    pub false_negatives: usize,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub accuracy: f64,
    /// Prediction rows with no ground-truth row
    pub unmatched_predictions: usize,
    /// Prediction rows repeating an earlier transaction ID; only the first is scored
    #[serde(default)]
    pub duplicate_predictions: usize,
    /// Ground-truth rows with no prediction
    pub unmatched_ground_truth: usize,
}

impl ConfusionMetrics {
    /// Derive scores from confusion counts
    pub fn from_counts(tp: usize, fp: usize, tn: usize, fn_: usize) -> Self {
        let precision = ratio(tp, tp + fp);
        let recall = ratio(tp, tp + fn_);
        let f1_score = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        let accuracy = ratio(tp + tn, tp + fp + tn + fn_);

        Self {
            true_positives: tp,
            false_positives: fp,
            true_negatives: tn,
            false_negatives: fn_,
            precision,
            recall,
            f1_score,
            accuracy,
            unmatched_predictions: 0,
            duplicate_predictions: 0,
            unmatched_ground_truth: 0,
        }
    }

    /// Number of matched records scored
    pub fn matched(&self) -> usize {
        self.true_positives + self.false_positives + self.true_negatives + self.false_negatives
    }

    /// Print summary statistics
    pub fn log_summary(&self) {
        info!("╔══════════════════════════════════════════════════════════════╗");
        info!("║            COUPON ABUSE DETECTION - CLASSIFIER METRICS       ║");
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ TP: {:>6}  FP: {:>6}  TN: {:>6}  FN: {:>6}               ║",
            self.true_positives, self.false_positives, self.true_negatives, self.false_negatives
        );
        info!(
            "║ Precision: {:>5.3}  Recall: {:>5.3}  F1: {:>5.3}  Acc: {:>5.3}   ║",
            self.precision, self.recall, self.f1_score, self.accuracy
        );
        info!(
            "║ Unmatched: {:>6} predictions, {:>6} labels                 ║",
            self.unmatched_predictions, self.unmatched_ground_truth
        );
        info!("╚══════════════════════════════════════════════════════════════╝");
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Compare predictions to ground truth by transaction ID.
///
/// Only the intersection is scored; records without a counterpart are
/// counted as unmatched rather than dropped silently. When a transaction ID
/// is predicted more than once the first prediction is used and the rest
/// are counted in `duplicate_predictions`.
pub fn evaluate(predictions: &[Prediction], ground_truth: &[GroundTruth]) -> ConfusionMetrics {
    let mut predicted: HashMap<&str, bool> = HashMap::with_capacity(predictions.len());
    for prediction in predictions {
        predicted
            .entry(prediction.transaction_id.as_str())
            .or_insert_with(|| prediction.is_fraud());
    }
    let duplicate_predictions = predictions.len() - predicted.len();

    let (mut tp, mut fp, mut tn, mut fn_) = (0, 0, 0, 0);
    let mut matched_ids: HashSet<&str> = HashSet::new();
    let mut unmatched_ground_truth = 0;

    for truth in ground_truth {
        let Some(&is_fraud_pred) = predicted.get(truth.transaction_id.as_str()) else {
            unmatched_ground_truth += 1;
            continue;
        };
        matched_ids.insert(truth.transaction_id.as_str());

        match (is_fraud_pred, truth.is_abuse()) {
            (true, true) => tp += 1,
            (true, false) => fp += 1,
            (false, false) => tn += 1,
            (false, true) => fn_ += 1,
        }
    }

    let unmatched_predictions = predictions
        .iter()
        .filter(|p| !matched_ids.contains(p.transaction_id.as_str()))
        .count();

    let mut metrics = ConfusionMetrics::from_counts(tp, fp, tn, fn_);
    metrics.unmatched_predictions = unmatched_predictions;
    metrics.duplicate_predictions = duplicate_predictions;
    metrics.unmatched_ground_truth = unmatched_ground_truth;

    if unmatched_predictions > 0 || unmatched_ground_truth > 0 {
        warn!(
            unmatched_predictions,
            unmatched_ground_truth, "Records without a counterpart were excluded from metrics"
        );
    }
    if duplicate_predictions > 0 {
        warn!(duplicate_predictions, "Repeated prediction IDs ignored after the first");
    }
    debug!(
        matched = metrics.matched(),
        precision = metrics.precision,
        recall = metrics.recall,
        "Metrics computed"
    );

    metrics
}

/// Convenience wrapper over scored results
pub fn evaluate_results(results: &[FraudResult], ground_truth: &[GroundTruth]) -> ConfusionMetrics {
    let predictions: Vec<Prediction> = results.iter().map(Prediction::from).collect();
    evaluate(&predictions, ground_truth)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_true_positive() {
        let predictions = vec![Prediction::new("tx1", 0.8)];
        let truth = vec![GroundTruth::new("tx1", 1)];

        let metrics = evaluate(&predictions, &truth);
        assert_eq!(metrics.true_positives, 1);
        assert_eq!(metrics.false_positives, 0);
        assert_eq!(metrics.true_negatives, 0);
        assert_eq!(metrics.false_negatives, 0);
        assert_eq!(metrics.precision, 1.0);
        assert_eq!(metrics.recall, 1.0);
        assert_eq!(metrics.f1_score, 1.0);
        assert_eq!(metrics.accuracy, 1.0);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let predictions = vec![Prediction::new("a", 0.7), Prediction::new("b", 0.69)];
        let truth = vec![GroundTruth::new("a", 0), GroundTruth::new("b", 1)];

        let metrics = evaluate(&predictions, &truth);
        assert_eq!(metrics.false_positives, 1);
        assert_eq!(metrics.false_negatives, 1);
        assert_eq!(metrics.precision, 0.0);
        assert_eq!(metrics.recall, 0.0);
        assert_eq!(metrics.f1_score, 0.0);
        assert_eq!(metrics.accuracy, 0.0);
    }

    #[test]
    fn test_mixed_confusion_matrix() {
        let predictions = vec![
            Prediction::new("t1", 0.9),
            Prediction::new("t2", 0.85),
            Prediction::new("t3", 0.75),
            Prediction::new("t4", 0.1),
            Prediction::new("t5", 0.0),
        ];
        let truth = vec![
            GroundTruth::new("t1", 1),
            GroundTruth::new("t2", 1),
            GroundTruth::new("t3", 0),
            GroundTruth::new("t4", 1),
            GroundTruth::new("t5", 0),
        ];

        let metrics = evaluate(&predictions, &truth);
        assert_eq!((metrics.true_positives, metrics.false_positives), (2, 1));
        assert_eq!((metrics.true_negatives, metrics.false_negatives), (1, 1));
        assert!((metrics.precision - 2.0 / 3.0).abs() < 1e-9);
        assert!((metrics.recall - 2.0 / 3.0).abs() < 1e-9);
        assert!((metrics.f1_score - 2.0 / 3.0).abs() < 1e-9);
        assert!((metrics.accuracy - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_unmatched_records_are_counted_not_scored() {
        let predictions = vec![Prediction::new("tx1", 0.8), Prediction::new("orphan", 0.9)];
        let truth = vec![GroundTruth::new("tx1", 1), GroundTruth::new("missing", 0)];

        let metrics = evaluate(&predictions, &truth);
        assert_eq!(metrics.matched(), 1);
        assert_eq!(metrics.unmatched_predictions, 1);
        assert_eq!(metrics.unmatched_ground_truth, 1);
        assert_eq!(metrics.accuracy, 1.0);
    }

    #[test]
    fn test_repeated_prediction_ids_are_reported() {
        let predictions = vec![
            Prediction::new("tx1", 0.9),
            Prediction::new("tx1", 0.1),
            Prediction::new("tx9", 0.2),
            Prediction::new("tx9", 0.2),
        ];
        let truth = vec![GroundTruth::new("tx1", 1)];

        let metrics = evaluate(&predictions, &truth);
        assert_eq!(metrics.matched(), 1);
        assert_eq!(metrics.true_positives, 1);
        assert_eq!(metrics.duplicate_predictions, 2);
        assert_eq!(metrics.unmatched_predictions, 2);
    }

    #[test]
    fn test_no_overlap_yields_zeroes() {
        let metrics = evaluate(&[Prediction::new("a", 0.9)], &[]);
        assert_eq!(metrics.matched(), 0);
        assert_eq!(metrics.accuracy, 0.0);
        assert_eq!(metrics.unmatched_predictions, 1);
    }

    #[test]
    fn test_ground_truth_from_labelled_transactions() {
        let txs = vec![
            Transaction::new("tx_1", "StoreA", 10.0, 1.0).with_label(true),
            Transaction::new("tx_2", "StoreA", 10.0, 1.0),
            Transaction::new("tx_3", "StoreA", 10.0, 1.0).with_label(false),
        ];

        let truth = GroundTruth::from_transactions(&txs);
        assert_eq!(truth, vec![GroundTruth::new("tx_1", 1), GroundTruth::new("tx_3", 0)]);
    }
}
