//! Rule scorer.
//!
//! Evaluates the atomic rules against one transaction and sums their
//! contributions into a saturating fraud score.

use crate::error::{DetectionError, Result};
use crate::indexer::DuplicateCounts;
use crate::rules::config::RuleConfig;
use crate::types::result::FraudResult;
use crate::types::rule::Rule;
use crate::types::transaction::Transaction;
use std::sync::Arc;
use tracing::debug;

/// Discount ratio above which the coupon is considered abusive
pub const HIGH_DISCOUNT_RATIO: f64 = 0.5;

/// Scores transactions against one rule configuration snapshot
#[derive(Debug, Clone)]
pub struct RuleScorer {
    config: Arc<RuleConfig>,
}

impl RuleScorer {
    pub fn new(config: Arc<RuleConfig>) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RuleConfig {
        &self.config
    }

    /// Score a transaction.
    ///
    /// Identity-reuse rules are only evaluated when `counts` is supplied.
    pub fn score(&self, tx: &Transaction, counts: Option<DuplicateCounts>) -> Result<FraudResult> {
        for (field, amount) in [
            ("original_amount", tx.original_amount),
            ("discount_amount", tx.discount_amount),
        ] {
            if !amount.is_finite() {
                return Err(DetectionError::Scoring {
                    transaction_id: tx.transaction_id.clone(),
                    reason: format!("{} is not a finite number ({})", field, amount),
                });
            }
        }

        let contributions: Vec<(Rule, f64)> = self
            .triggered_rules(tx, counts)
            .into_iter()
            .map(|rule| (rule, self.config.weight_for(rule)))
            .collect();

        let result = FraudResult::new(tx.transaction_id.clone(), contributions, self.config.version);

        debug!(
            transaction_id = %result.transaction_id,
            fraud_score = result.fraud_score,
            risk_level = result.risk_level.as_str(),
            triggered = ?result.triggered_rules,
            "Transaction scored"
        );

        Ok(result)
    }

    /// Rules firing for a transaction, in evaluation order
    pub fn triggered_rules(&self, tx: &Transaction, counts: Option<DuplicateCounts>) -> Vec<Rule> {
        let mut rules = Vec::new();

        if self.config.is_fraudulent_vendor(&tx.vendor_name) {
            rules.push(Rule::FraudulentVendorName);
        }

        // undefined ratio (zero original amount) skips the rule
        if tx.discount_ratio().is_some_and(|ratio| ratio > HIGH_DISCOUNT_RATIO) {
            rules.push(Rule::HighDiscountRatio);
        }

        if let Some(counts) = counts {
            if counts.phone_number_count >= self.config.min_occurrences(Rule::SamePhoneMultipleAccounts) {
                rules.push(Rule::SamePhoneMultipleAccounts);
            }
            if counts.user_name_count >= self.config.min_occurrences(Rule::SameUserNameMultipleAccounts) {
                rules.push(Rule::SameUserNameMultipleAccounts);
            }
        }

        rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::config::{default_categories, RuleCategory};
    use crate::types::result::RiskLevel;

    fn scorer() -> RuleScorer {
        RuleScorer::new(Arc::new(RuleConfig::default()))
    }

    fn unique() -> Option<DuplicateCounts> {
        Some(DuplicateCounts {
            phone_number_count: 1,
            user_name_count: 1,
        })
    }

    #[test]
    fn test_fraudulent_vendor() {
        let tx = Transaction::new("tx_1", "FakeShop", 100.0, 20.0);
        let result = scorer().score(&tx, unique()).unwrap();

        assert!((result.fraud_score - 0.90).abs() < 1e-9);
        assert_eq!(result.triggered_rules, vec![Rule::FraudulentVendorName]);
        assert_eq!(result.risk_level, RiskLevel::Critical);
        assert!(result.manual_review_required);
    }

    #[test]
    fn test_high_discount_ratio() {
        let tx = Transaction::new("tx_2", "StoreA", 100.0, 60.0);
        let result = scorer().score(&tx, unique()).unwrap();

        assert!((result.fraud_score - 0.75).abs() < 1e-9);
        assert_eq!(result.triggered_rules, vec![Rule::HighDiscountRatio]);
        assert_eq!(result.risk_level, RiskLevel::High);
    }

    #[test]
    fn test_ratio_of_exactly_half_does_not_fire() {
        let tx = Transaction::new("tx_half", "StoreA", 100.0, 50.0);
        let result = scorer().score(&tx, None).unwrap();
        assert!(result.triggered_rules.is_empty());
        assert_eq!(result.risk_level, RiskLevel::Low);
    }

    #[test]
    fn test_reused_user_name() {
        let tx = Transaction::new("tx_3", "StoreA", 100.0, 10.0);
        let counts = DuplicateCounts {
            phone_number_count: 1,
            user_name_count: 3,
        };
        let result = scorer().score(&tx, Some(counts)).unwrap();

        assert!((result.fraud_score - 0.85).abs() < 1e-9);
        assert_eq!(result.triggered_rules, vec![Rule::SameUserNameMultipleAccounts]);
        assert_eq!(result.risk_level, RiskLevel::High);
        assert!(result.manual_review_required);
    }

    #[test]
    fn test_zero_original_amount_skips_ratio_rule() {
        let tx = Transaction::new("tx_4", "ScamStore", 0.0, 0.0);
        let result = scorer().score(&tx, unique()).unwrap();

        assert_eq!(result.triggered_rules, vec![Rule::FraudulentVendorName]);
        assert!((result.fraud_score - 0.90).abs() < 1e-9);
    }

    #[test]
    fn test_contributions_add_and_saturate() {
        let tx = Transaction::new("tx_5", "FraudMart", 100.0, 90.0);
        let counts = DuplicateCounts {
            phone_number_count: 2,
            user_name_count: 2,
        };
        let result = scorer().score(&tx, Some(counts)).unwrap();

        assert_eq!(result.fraud_score, 1.0);
        assert_eq!(result.triggered_rules, Rule::ALL.to_vec());
        assert_eq!(result.rule_weights.len(), 4);
        assert_eq!(result.rule_weights[&Rule::SamePhoneMultipleAccounts], 0.85);
    }

    #[test]
    fn test_identity_rules_need_counts() {
        let tx = Transaction::new("tx_6", "StoreA", 100.0, 10.0);
        let result = scorer().score(&tx, None).unwrap();
        assert!(result.triggered_rules.is_empty());
        assert_eq!(result.fraud_score, 0.0);
    }

    #[test]
    fn test_scoring_is_idempotent() {
        let tx = Transaction::new("tx_7", "FakeShop", 100.0, 70.0);
        let scorer = scorer();
        let first = scorer.score(&tx, unique()).unwrap();
        let second = scorer.score(&tx, unique()).unwrap();
        assert!(first.same_outcome(&second));
    }

    #[test]
    fn test_non_finite_amount_is_scoring_error() {
        let tx = Transaction::new("tx_8", "StoreA", f64::NAN, 1.0);
        let err = scorer().score(&tx, None).unwrap_err();
        assert_eq!(
            err,
            DetectionError::Scoring {
                transaction_id: "tx_8".to_string(),
                reason: "original_amount is not a finite number (NaN)".to_string(),
            }
        );
    }

    #[test]
    fn test_weights_follow_config_version() {
        let mut categories = default_categories();
        categories[2] = RuleCategory::new("base_abuse", vec![Rule::HighDiscountRatio], 0.55, 1);
        let config = RuleConfig::default().with_categories(categories);
        let scorer = RuleScorer::new(Arc::new(config));

        let tx = Transaction::new("tx_9", "StoreA", 100.0, 80.0);
        let result = scorer.score(&tx, None).unwrap();

        assert_eq!(result.config_version, 2);
        assert!((result.fraud_score - 0.55).abs() < 1e-9);
        assert_eq!(result.risk_level, RiskLevel::Medium);
    }

    #[test]
    fn test_score_always_in_unit_range() {
        let scorer = scorer();
        for (i, (vendor, original, discount)) in [
            ("StoreA", 10.0, 0.0),
            ("FakeShop", 10.0, 10.0),
            ("ScamStore", 0.0, 0.0),
            ("StoreB", 1000.0, 999.0),
        ]
        .into_iter()
        .enumerate()
        {
            let tx = Transaction::new(format!("tx_{}", i), vendor, original, discount);
            let counts = DuplicateCounts {
                phone_number_count: i + 1,
                user_name_count: i + 1,
            };
            let result = scorer.score(&tx, Some(counts)).unwrap();
            assert!((0.0..=1.0).contains(&result.fraud_score));
            assert_eq!(result.risk_level, RiskLevel::from_score(result.fraud_score));
        }
    }
}
