//! Feedback from ground truth into rule weights.
//!
//! [`analyze`] measures how often each rule fired on a correctly classified
//! transaction; [`update_rule_weights`] turns those accuracies into the next
//! version of the category weight table.

use crate::metrics::GroundTruth;
use crate::rules::config::{RuleCategory, RuleConfig};
use crate::types::result::{round2, FraudResult};
use crate::types::rule::Rule;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

/// Lower bound for a feedback-adjusted category weight
pub const MIN_RULE_WEIGHT: f64 = 0.5;
/// Upper bound for a feedback-adjusted category weight
pub const MAX_RULE_WEIGHT: f64 = 0.95;

/// How often a rule fired on correct versus incorrect predictions
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleStats {
    pub correct: usize,
    pub incorrect: usize,
    pub accuracy: f64,
}

impl RuleStats {
    fn record(&mut self, is_correct: bool) {
        if is_correct {
            self.correct += 1;
        } else {
            self.incorrect += 1;
        }
        let total = self.correct + self.incorrect;
        self.accuracy = self.correct as f64 / total as f64;
    }
}

/// Per-rule effectiveness
pub type RuleEffectiveness = BTreeMap<Rule, RuleStats>;

/// Misclassification counts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorAnalysis {
    pub total_errors: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
}

/// Outcome of comparing past predictions to ground truth
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedbackAnalysis {
    pub rule_effectiveness: RuleEffectiveness,
    pub error_analysis: ErrorAnalysis,
    /// Transactions predicted as fraud but labelled clean
    pub false_positive_examples: Vec<String>,
    /// Transactions labelled abuse but predicted clean
    pub false_negative_examples: Vec<String>,
}

/// Measure rule effectiveness over results that have a ground-truth label
pub fn analyze(results: &[FraudResult], ground_truth: &[GroundTruth]) -> FeedbackAnalysis {
    let labels: HashMap<&str, bool> = ground_truth
        .iter()
        .map(|t| (t.transaction_id.as_str(), t.is_abuse()))
        .collect();

    let mut analysis = FeedbackAnalysis::default();

    for result in results {
        let Some(&is_abuse) = labels.get(result.transaction_id.as_str()) else {
            continue;
        };
        let predicted = result.predicts_fraud();
        let is_correct = predicted == is_abuse;

        for rule in &result.triggered_rules {
            analysis
                .rule_effectiveness
                .entry(*rule)
                .or_default()
                .record(is_correct);
        }

        if !is_correct {
            analysis.error_analysis.total_errors += 1;
            if predicted {
                analysis.error_analysis.false_positives += 1;
                analysis.false_positive_examples.push(result.transaction_id.clone());
            } else {
                analysis.error_analysis.false_negatives += 1;
                analysis.false_negative_examples.push(result.transaction_id.clone());
            }
        }
    }

    debug!(
        rules = analysis.rule_effectiveness.len(),
        errors = analysis.error_analysis.total_errors,
        "Feedback analysis complete"
    );

    analysis
}

/// Original and recomputed rule configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightUpdate {
    pub original: RuleConfig,
    pub updated: RuleConfig,
}

impl WeightUpdate {
    /// Categories whose weight changed, as (name, old, new)
    pub fn changes(&self) -> Vec<(String, f64, f64)> {
        self.original
            .categories
            .iter()
            .zip(&self.updated.categories)
            .filter(|(old, new)| old.weight != new.weight)
            .map(|(old, new)| (old.name.clone(), old.weight, new.weight))
            .collect()
    }
}

/// Recompute category weights from rule accuracy.
///
/// A category's weight becomes the mean accuracy of its rules that have
/// observations, clamped to [0.5, 0.95] and rounded to 2 decimals.
/// Categories with no observed rules keep their weight.
pub fn update_rule_weights(config: &RuleConfig, effectiveness: &RuleEffectiveness) -> WeightUpdate {
    let categories: Vec<RuleCategory> = config
        .categories
        .iter()
        .map(|category| {
            let accuracies: Vec<f64> = category
                .rules
                .iter()
                .filter_map(|rule| effectiveness.get(rule).map(|stats| stats.accuracy))
                .collect();

            if accuracies.is_empty() {
                return category.clone();
            }

            let avg_accuracy = accuracies.iter().sum::<f64>() / accuracies.len() as f64;
            let weight = round2(avg_accuracy.clamp(MIN_RULE_WEIGHT, MAX_RULE_WEIGHT));

            debug!(
                category = %category.name,
                old_weight = category.weight,
                new_weight = weight,
                observed_rules = accuracies.len(),
                "Category weight recomputed"
            );

            RuleCategory {
                weight,
                ..category.clone()
            }
        })
        .collect();

    let updated = config.with_categories(categories);
    info!(
        from_version = config.version,
        to_version = updated.version,
        "Rule weights updated from feedback"
    );

    WeightUpdate {
        original: config.clone(),
        updated,
    }
}
