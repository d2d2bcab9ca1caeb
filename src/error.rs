//! Error taxonomy for validation, scoring and aggregation

use serde::Serialize;
use thiserror::Error;

/// Reasons a raw record is rejected by the validator
#[derive(Debug, Clone, Error, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationError {
    /// A required field is absent (or null)
    #[error("schema error: missing required field `{field}`")]
    Schema { field: String },

    /// A field is present but cannot be interpreted
    #[error("format error: field `{field}` has value `{value}`: {reason}")]
    Format {
        field: String,
        value: String,
        reason: String,
    },

    /// A field parses but is outside its allowed range
    #[error("range error: field `{field}` has value `{value}`: {reason}")]
    Range {
        field: String,
        value: String,
        reason: String,
    },
}

impl ValidationError {
    /// Name of the offending field
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Schema { field }
            | ValidationError::Format { field, .. }
            | ValidationError::Range { field, .. } => field,
        }
    }
}

/// Errors raised while scoring or aggregating transactions
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DetectionError {
    /// Unexpected shape or value encountered while scoring one transaction
    #[error("scoring error for transaction {transaction_id}: {reason}")]
    Scoring {
        transaction_id: String,
        reason: String,
    },

    /// Percentages are undefined for an empty batch
    #[error("cannot aggregate an empty batch")]
    EmptyBatch,

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

pub type Result<T, E = DetectionError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_field() {
        let err = ValidationError::Schema {
            field: "email".to_string(),
        };
        assert_eq!(err.field(), "email");
        assert!(err.to_string().contains("`email`"));

        let err = ValidationError::Range {
            field: "items_count".to_string(),
            value: "0".to_string(),
            reason: "must be at least 1".to_string(),
        };
        assert!(err.to_string().starts_with("range error"));
    }

    #[test]
    fn test_validation_error_converts_into_detection_error() {
        let err: DetectionError = ValidationError::Schema {
            field: "merchant".to_string(),
        }
        .into();
        assert!(matches!(err, DetectionError::Validation(_)));
    }
}
