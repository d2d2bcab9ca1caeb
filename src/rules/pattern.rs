//! Single-rule checks with a human-readable reason

use crate::indexer::IndexedTransaction;
use crate::rules::config::RuleConfig;
use crate::rules::scorer::HIGH_DISCOUNT_RATIO;
use crate::types::rule::Rule;
use serde::Serialize;

/// Result of checking one rule against one transaction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternMatch {
    pub rule: Rule,
    pub matched: bool,
    pub explanation: String,
}

/// Check whether an annotated transaction matches `rule`
pub fn match_pattern(indexed: &IndexedTransaction, rule: Rule, config: &RuleConfig) -> PatternMatch {
    let tx = &indexed.transaction;

    let (matched, reason) = match rule {
        Rule::FraudulentVendorName => (
            config.is_fraudulent_vendor(&tx.vendor_name),
            format!("Vendor '{}' is in the list of known fraudulent vendors", tx.vendor_name),
        ),
        Rule::HighDiscountRatio => match indexed.discount_ratio {
            Some(ratio) => (
                ratio > HIGH_DISCOUNT_RATIO,
                format!("Discount ratio ({:.2}) is suspiciously high", ratio),
            ),
            None => (false, String::new()),
        },
        Rule::SamePhoneMultipleAccounts => (
            indexed.phone_number_count >= config.min_occurrences(rule),
            format!(
                "Phone number '{}' is used in {} transactions",
                tx.phone_number, indexed.phone_number_count
            ),
        ),
        Rule::SameUserNameMultipleAccounts => (
            indexed.user_name_count >= config.min_occurrences(rule),
            format!(
                "User name '{}' appears in {} transactions",
                tx.user_name, indexed.user_name_count
            ),
        ),
    };

    PatternMatch {
        rule,
        matched,
        explanation: if matched {
            reason
        } else {
            format!("No match for pattern '{}'", rule)
        },
    }
}
