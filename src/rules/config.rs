//! Versioned rule configuration.
//!
//! A [`RuleConfig`] is an immutable value: the fraudulent vendor list plus
//! the category weight table. Scoring reads a snapshot; the feedback cycle
//! produces a new version which is published between batches.

use crate::types::rule::Rule;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use tracing::info;

/// Default fraudulent vendor names
pub fn default_fraudulent_vendors() -> Vec<String> {
    ["FakeShop", "ScamStore", "FraudMart"]
        .iter()
        .map(|v| v.to_string())
        .collect()
}

/// A named group of atomic rules sharing one weight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleCategory {
    pub name: String,
    /// Atomic rules owned by this category
    pub rules: Vec<Rule>,
    /// Score contribution of each rule in the category
    pub weight: f64,
    /// Minimum occurrences for the category to apply
    #[serde(default = "default_category_threshold")]
    pub threshold: u32,
}

fn default_category_threshold() -> u32 {
    1
}

impl RuleCategory {
    pub fn new(name: &str, rules: Vec<Rule>, weight: f64, threshold: u32) -> Self {
        Self {
            name: name.to_string(),
            rules,
            weight,
            threshold,
        }
    }
}

/// Default category table
pub fn default_categories() -> Vec<RuleCategory> {
    vec![
        RuleCategory::new(
            "identity_reuse",
            vec![Rule::SamePhoneMultipleAccounts, Rule::SameUserNameMultipleAccounts],
            0.85,
            2,
        ),
        RuleCategory::new("vendor_check", vec![Rule::FraudulentVendorName], 0.90, 1),
        RuleCategory::new("base_abuse", vec![Rule::HighDiscountRatio], 0.75, 1),
    ]
}

/// Immutable rule configuration at a given version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    pub version: u64,
    pub fraudulent_vendors: Vec<String>,
    pub categories: Vec<RuleCategory>,
}

impl RuleConfig {
    pub fn new(fraudulent_vendors: Vec<String>, categories: Vec<RuleCategory>) -> Self {
        Self {
            version: 1,
            fraudulent_vendors,
            categories,
        }
    }

    /// Contribution applied when `rule` fires.
    ///
    /// Rules not owned by any category contribute nothing.
    pub fn weight_for(&self, rule: Rule) -> f64 {
        self.category_of(rule).map(|c| c.weight).unwrap_or(0.0)
    }

    /// Category owning `rule`
    pub fn category_of(&self, rule: Rule) -> Option<&RuleCategory> {
        self.categories.iter().find(|c| c.rules.contains(&rule))
    }

    /// Occurrences needed before an identity counts as reused (never below 2)
    pub fn min_occurrences(&self, rule: Rule) -> usize {
        self.category_of(rule)
            .map(|c| c.threshold as usize)
            .unwrap_or(2)
            .max(2)
    }

    pub fn category(&self, name: &str) -> Option<&RuleCategory> {
        self.categories.iter().find(|c| c.name == name)
    }

    pub fn is_fraudulent_vendor(&self, vendor_name: &str) -> bool {
        self.fraudulent_vendors.iter().any(|v| v == vendor_name)
    }

    /// Next version with a replaced category table
    pub fn with_categories(&self, categories: Vec<RuleCategory>) -> Self {
        Self {
            version: self.version + 1,
            fraudulent_vendors: self.fraudulent_vendors.clone(),
            categories,
        }
    }
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self::new(default_fraudulent_vendors(), default_categories())
    }
}

/// Holder of the current rule configuration.
///
/// Readers take an `Arc` snapshot and keep it for a whole batch, so a
/// concurrent publish never changes weights mid-batch.
#[derive(Debug, Default)]
pub struct RuleConfigStore {
    current: RwLock<Arc<RuleConfig>>,
}

impl RuleConfigStore {
    pub fn new(config: RuleConfig) -> Self {
        Self {
            current: RwLock::new(Arc::new(config)),
        }
    }

    /// Current configuration
    pub fn snapshot(&self) -> Arc<RuleConfig> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Replace the current configuration
    pub fn publish(&self, config: RuleConfig) {
        info!(version = config.version, "Publishing rule configuration");
        let config = Arc::new(config);
        match self.current.write() {
            Ok(mut guard) => *guard = config,
            Err(poisoned) => *poisoned.into_inner() = config,
        }
    }

    pub fn version(&self) -> u64 {
        self.snapshot().version
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights() {
        let config = RuleConfig::default();
        assert_eq!(config.version, 1);
        assert_eq!(config.weight_for(Rule::FraudulentVendorName), 0.90);
        assert_eq!(config.weight_for(Rule::HighDiscountRatio), 0.75);
        assert_eq!(config.weight_for(Rule::SamePhoneMultipleAccounts), 0.85);
        assert_eq!(config.weight_for(Rule::SameUserNameMultipleAccounts), 0.85);
        assert_eq!(config.category("identity_reuse").map(|c| c.threshold), Some(2));
        assert!(config.is_fraudulent_vendor("ScamStore"));
        assert!(!config.is_fraudulent_vendor("StoreA"));
    }

    #[test]
    fn test_min_occurrences_never_below_two() {
        let config = RuleConfig::default();
        assert_eq!(config.min_occurrences(Rule::SamePhoneMultipleAccounts), 2);

        let config = RuleConfig::new(
            default_fraudulent_vendors(),
            vec![
                RuleCategory::new("phone_reuse", vec![Rule::SamePhoneMultipleAccounts], 0.85, 1),
                RuleCategory::new("name_reuse", vec![Rule::SameUserNameMultipleAccounts], 0.85, 3),
            ],
        );
        assert_eq!(config.min_occurrences(Rule::SamePhoneMultipleAccounts), 2);
        assert_eq!(config.min_occurrences(Rule::SameUserNameMultipleAccounts), 3);
    }

    #[test]
    fn test_unowned_rule_contributes_nothing() {
        let config = RuleConfig::new(
            default_fraudulent_vendors(),
            vec![RuleCategory::new("vendor_check", vec![Rule::FraudulentVendorName], 0.9, 1)],
        );
        assert_eq!(config.weight_for(Rule::HighDiscountRatio), 0.0);
    }

    #[test]
    fn test_snapshot_survives_publish() {
        let store = RuleConfigStore::new(RuleConfig::default());
        let before = store.snapshot();

        let mut categories = default_categories();
        categories[0].weight = 0.6;
        store.publish(before.with_categories(categories));

        assert_eq!(before.version, 1);
        assert_eq!(before.weight_for(Rule::SamePhoneMultipleAccounts), 0.85);
        assert_eq!(store.version(), 2);
        assert_eq!(store.snapshot().weight_for(Rule::SamePhoneMultipleAccounts), 0.6);
    }

    #[test]
    fn test_categories_deserialize_from_rule_names() {
        let json = r#"{"name":"base_abuse","rules":["high_discount_ratio"],"weight":0.7}"#;
        let category: RuleCategory = serde_json::from_str(json).unwrap();
        assert_eq!(category.rules, vec![Rule::HighDiscountRatio]);
        assert_eq!(category.threshold, 1);
    }
}
