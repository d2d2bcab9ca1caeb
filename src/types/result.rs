//! Fraud scoring results and batch summaries

use crate::types::rule::Rule;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Score at or above which a transaction needs human adjudication
pub const MANUAL_REVIEW_THRESHOLD: f64 = 0.7;

/// Fixed risk tier boundaries
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RiskLevelThresholds {
    pub medium: f64,
    pub high: f64,
    pub critical: f64,
}

impl RiskLevelThresholds {
    pub const FIXED: RiskLevelThresholds = RiskLevelThresholds {
        medium: 0.4,
        high: 0.7,
        critical: 0.9,
    };
}

/// Risk level classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Determine risk level from a fraud score
    pub fn from_score(score: f64) -> Self {
        let thresholds = RiskLevelThresholds::FIXED;
        if score >= thresholds.critical {
            RiskLevel::Critical
        } else if score >= thresholds.high {
            RiskLevel::High
        } else if score >= thresholds.medium {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    /// Anything above LOW counts as flagged
    pub fn is_flagged(&self) -> bool {
        *self != RiskLevel::Low
    }

    pub fn is_high_risk(&self) -> bool {
        matches!(self, RiskLevel::High | RiskLevel::Critical)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
            RiskLevel::Critical => "CRITICAL",
        }
    }
}

/// Outcome of scoring one transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FraudResult {
    /// Scored transaction ID
    pub transaction_id: String,

    /// Saturating sum of rule contributions (0.0 - 1.0)
    pub fraud_score: f64,

    /// Risk level classification
    pub risk_level: RiskLevel,

    /// Rules that fired, in evaluation order
    pub triggered_rules: Vec<Rule>,

    /// Contribution applied per triggered rule
    pub rule_weights: BTreeMap<Rule, f64>,

    pub manual_review_required: bool,

    /// Version of the rule configuration the score was computed with
    pub config_version: u64,

    /// Scoring timestamp
    pub timestamp: DateTime<Utc>,
}

impl FraudResult {
    /// Build a result from the triggered rules and their contributions.
    ///
    /// The score saturates at 1.0; tier and review flag derive from it.
    pub fn new(transaction_id: String, contributions: Vec<(Rule, f64)>, config_version: u64) -> Self {
        let raw: f64 = contributions.iter().map(|(_, weight)| weight).sum();
        let fraud_score = raw.clamp(0.0, 1.0);

        Self {
            transaction_id,
            fraud_score,
            risk_level: RiskLevel::from_score(fraud_score),
            triggered_rules: contributions.iter().map(|(rule, _)| *rule).collect(),
            rule_weights: contributions.into_iter().collect(),
            manual_review_required: fraud_score >= MANUAL_REVIEW_THRESHOLD,
            config_version,
            timestamp: Utc::now(),
        }
    }

    /// Whether the result counts as a positive fraud prediction
    pub fn predicts_fraud(&self) -> bool {
        self.fraud_score >= MANUAL_REVIEW_THRESHOLD
    }

    /// Compare two results ignoring the scoring timestamp
    pub fn same_outcome(&self, other: &FraudResult) -> bool {
        self.transaction_id == other.transaction_id
            && self.fraud_score == other.fraud_score
            && self.risk_level == other.risk_level
            && self.triggered_rules == other.triggered_rules
            && self.rule_weights == other.rule_weights
            && self.manual_review_required == other.manual_review_required
            && self.config_version == other.config_version
    }
}

/// Roll-up of a scored batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total_transactions: usize,
    /// Results with risk level above LOW
    pub flagged_transactions: usize,
    /// Results at HIGH or CRITICAL
    pub high_risk_transactions: usize,
    pub flagged_percentage: f64,
    pub high_risk_percentage: f64,
}

impl BatchSummary {
    /// Summarise results against the number of transactions submitted.
    ///
    /// Returns `None` when `total` is zero, since percentages are undefined.
    pub fn from_results(results: &[FraudResult], total: usize) -> Option<Self> {
        if total == 0 {
            return None;
        }

        let flagged = results.iter().filter(|r| r.risk_level.is_flagged()).count();
        let high_risk = results.iter().filter(|r| r.risk_level.is_high_risk()).count();

        Some(Self {
            total_transactions: total,
            flagged_transactions: flagged,
            high_risk_transactions: high_risk,
            flagged_percentage: percentage(flagged, total),
            high_risk_percentage: percentage(high_risk, total),
        })
    }
}

/// Share of `part` in `total` as a percentage rounded to 2 decimals
pub(crate) fn percentage(part: usize, total: usize) -> f64 {
    round2(part as f64 / total as f64 * 100.0)
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
