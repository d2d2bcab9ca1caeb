//! Type definitions for coupon abuse detection

pub mod result;
pub mod rule;
pub mod transaction;

pub use result::{BatchSummary, FraudResult, RiskLevel, MANUAL_REVIEW_THRESHOLD};
pub use rule::Rule;
pub use transaction::{Channel, RawRecord, Transaction};
