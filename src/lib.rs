//! Coupon Abuse Detector Library
//!
//! Deterministic rule scoring for coupon redemptions: fraudulent vendors,
//! excessive discounts and identity reuse, with batch summaries,
//! classifier metrics against labels and feedback-tuned rule weights.

pub mod batch;
pub mod config;
pub mod error;
pub mod feedback;
pub mod indexer;
pub mod loader;
pub mod metrics;
pub mod rules;
pub mod types;
pub mod validator;

pub use batch::{BatchEvaluator, BatchReport};
pub use config::AppConfig;
pub use error::{DetectionError, ValidationError};
pub use indexer::{DuplicateCounts, DuplicateIndex};
pub use metrics::{ConfusionMetrics, GroundTruth, Prediction};
pub use rules::{RuleConfig, RuleConfigStore, RuleScorer};
pub use types::{BatchSummary, FraudResult, RiskLevel, Rule, Transaction};
