//! Fraud rules: configuration, scoring and single-pattern checks

pub mod config;
pub mod pattern;
pub mod scorer;

pub use config::{RuleCategory, RuleConfig, RuleConfigStore};
pub use pattern::{match_pattern, PatternMatch};
pub use scorer::RuleScorer;
