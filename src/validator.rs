//! Transaction validation.
//!
//! Turns untyped records into [`Transaction`] values. Single-record
//! validation fails fast on the first problem; batch validation partitions
//! the input and never fails.

use crate::error::ValidationError;
use crate::types::transaction::{Channel, RawRecord, Transaction};
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

/// Fields every record must carry, in schema order
pub const REQUIRED_FIELDS: [&str; 14] = [
    "transaction_id",
    "user_id",
    "user_name",
    "email",
    "phone_number",
    "transaction_date",
    "merchant",
    "vendor_name",
    "channel",
    "items_count",
    "original_amount",
    "discount_amount",
    "final_amount",
    "coupon_code",
];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A rejected record kept verbatim for manual follow-up
#[derive(Debug, Clone, Serialize)]
pub struct InvalidRecord {
    pub record: RawRecord,
    pub error: ValidationError,
}

impl InvalidRecord {
    pub fn message(&self) -> String {
        self.error.to_string()
    }
}

/// Outcome of validating a batch of records
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub valid: Vec<Transaction>,
    pub invalid: Vec<InvalidRecord>,
}

impl ValidationReport {
    pub fn valid_count(&self) -> usize {
        self.valid.len()
    }

    pub fn invalid_count(&self) -> usize {
        self.invalid.len()
    }

    /// True when every record passed
    pub fn is_clean(&self) -> bool {
        self.invalid.is_empty()
    }
}

/// Validate a single raw record
pub fn validate(record: &RawRecord) -> Result<Transaction, ValidationError> {
    if let Some(missing) = REQUIRED_FIELDS.iter().find(|field| field_value(record, field).is_none()) {
        return Err(ValidationError::Schema {
            field: missing.to_string(),
        });
    }

    let date_text = text_field(record, "transaction_date")?;
    let transaction_date =
        NaiveDate::parse_from_str(date_text.trim(), DATE_FORMAT).map_err(|e| ValidationError::Format {
            field: "transaction_date".to_string(),
            value: date_text.clone(),
            reason: format!("expected YYYY-MM-DD ({})", e),
        })?;

    let channel_text = text_field(record, "channel")?;
    let channel = Channel::parse(&channel_text).ok_or_else(|| ValidationError::Format {
        field: "channel".to_string(),
        value: channel_text.clone(),
        reason: "expected `online` or `in-store`".to_string(),
    })?;

    let items_count = items_count_field(record)?;
    let original_amount = amount_field(record, "original_amount")?;
    let discount_amount = amount_field(record, "discount_amount")?;
    let final_amount = amount_field(record, "final_amount")?;
    let abuse = label_field(record)?;

    Ok(Transaction {
        transaction_id: text_field(record, "transaction_id")?,
        user_id: text_field(record, "user_id")?,
        user_name: text_field(record, "user_name")?,
        email: text_field(record, "email")?,
        phone_number: text_field(record, "phone_number")?,
        transaction_date,
        merchant: text_field(record, "merchant")?,
        vendor_name: text_field(record, "vendor_name")?,
        channel,
        items_count,
        original_amount,
        discount_amount,
        final_amount,
        coupon_code: text_field(record, "coupon_code")?,
        abuse,
    })
}

/// Validate every record, partitioning into valid and invalid lists
pub fn validate_batch(records: Vec<RawRecord>) -> ValidationReport {
    let mut report = ValidationReport::default();

    for record in records {
        match validate(&record) {
            Ok(transaction) => report.valid.push(transaction),
            Err(error) => {
                warn!(
                    transaction_id = record_id(&record),
                    error = %error,
                    "Rejected transaction record"
                );
                report.invalid.push(InvalidRecord { record, error });
            }
        }
    }

    debug!(
        valid = report.valid_count(),
        invalid = report.invalid_count(),
        "Batch validation complete"
    );

    report
}

fn record_id(record: &RawRecord) -> &str {
    record
        .get("transaction_id")
        .and_then(Value::as_str)
        .unwrap_or("<unknown>")
}

/// Present value of a field; null and blank text count as absent
fn field_value<'a>(record: &'a RawRecord, field: &str) -> Option<&'a Value> {
    record.get(field).filter(|value| match value {
        Value::Null => false,
        Value::String(text) => !text.trim().is_empty(),
        _ => true,
    })
}

fn required<'a>(record: &'a RawRecord, field: &str) -> Result<&'a Value, ValidationError> {
    field_value(record, field).ok_or_else(|| ValidationError::Schema {
        field: field.to_string(),
    })
}

fn text_field(record: &RawRecord, field: &str) -> Result<String, ValidationError> {
    match required(record, field)? {
        Value::String(text) => Ok(text.clone()),
        Value::Number(number) => Ok(number.to_string()),
        Value::Bool(flag) => Ok(flag.to_string()),
        other => Err(ValidationError::Format {
            field: field.to_string(),
            value: other.to_string(),
            reason: "expected a scalar value".to_string(),
        }),
    }
}

fn number_field(record: &RawRecord, field: &str) -> Result<f64, ValidationError> {
    let value = required(record, field)?;
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };

    parsed.filter(|n| n.is_finite()).ok_or_else(|| ValidationError::Format {
        field: field.to_string(),
        value: display_value(value),
        reason: "expected a number".to_string(),
    })
}

fn amount_field(record: &RawRecord, field: &str) -> Result<f64, ValidationError> {
    let amount = number_field(record, field)?;
    if amount < 0.0 {
        return Err(ValidationError::Range {
            field: field.to_string(),
            value: amount.to_string(),
            reason: "amount cannot be negative".to_string(),
        });
    }
    Ok(amount)
}

fn items_count_field(record: &RawRecord) -> Result<u32, ValidationError> {
    let count = number_field(record, "items_count")?;
    if count.fract() != 0.0 {
        return Err(ValidationError::Format {
            field: "items_count".to_string(),
            value: count.to_string(),
            reason: "expected a whole number".to_string(),
        });
    }
    if count < 1.0 {
        return Err(ValidationError::Range {
            field: "items_count".to_string(),
            value: count.to_string(),
            reason: "items count must be at least 1".to_string(),
        });
    }
    if count > f64::from(u32::MAX) {
        return Err(ValidationError::Range {
            field: "items_count".to_string(),
            value: count.to_string(),
            reason: "items count is too large".to_string(),
        });
    }
    Ok(count as u32)
}

/// Optional 0/1 ground-truth label; an empty CSV cell means unlabelled
fn label_field(record: &RawRecord) -> Result<Option<u8>, ValidationError> {
    let Some(value) = field_value(record, "abuse") else {
        return Ok(None);
    };

    let label = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        Value::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
        _ => None,
    };

    match label {
        Some(l) if l == 0.0 => Ok(Some(0)),
        Some(l) if l == 1.0 => Ok(Some(1)),
        _ => Err(ValidationError::Range {
            field: "abuse".to_string(),
            value: display_value(value),
            reason: "label must be 0 or 1".to_string(),
        }),
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawRecord {
        match value {
            Value::Object(map) => map,
            _ => panic!("test record must be an object"),
        }
    }

    fn sample() -> RawRecord {
        raw(json!({
            "transaction_id": "tx_0001",
            "user_id": "user_001",
            "user_name": "Alice Smith_1",
            "email": "alice@example.com",
            "phone_number": "+27612345678",
            "transaction_date": "2024-03-15",
            "merchant": "StoreA",
            "vendor_name": "StoreB",
            "channel": "online",
            "items_count": 2,
            "original_amount": 120.5,
            "discount_amount": 12.05,
            "final_amount": 108.45,
            "coupon_code": "SAVE10",
            "abuse": 0
        }))
    }

    #[test]
    fn test_valid_record() {
        let tx = validate(&sample()).unwrap();
        assert_eq!(tx.transaction_id, "tx_0001");
        assert_eq!(tx.transaction_date, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert_eq!(tx.channel, Channel::Online);
        assert_eq!(tx.items_count, 2);
        assert_eq!(tx.abuse, Some(0));
    }

    #[test]
    fn test_csv_style_strings_are_accepted() {
        let mut record = sample();
        record.insert("items_count".to_string(), json!("3"));
        record.insert("original_amount".to_string(), json!("50.00"));
        record.insert("channel".to_string(), json!("in-store"));
        record.insert("abuse".to_string(), json!(""));

        let tx = validate(&record).unwrap();
        assert_eq!(tx.items_count, 3);
        assert_eq!(tx.original_amount, 50.0);
        assert_eq!(tx.channel, Channel::InStore);
        assert_eq!(tx.abuse, None);
    }

    #[test]
    fn test_missing_field_is_schema_error() {
        let mut record = sample();
        record.remove("email");
        assert_eq!(
            validate(&record),
            Err(ValidationError::Schema {
                field: "email".to_string()
            })
        );

        let mut record = sample();
        record.insert("coupon_code".to_string(), Value::Null);
        assert!(matches!(validate(&record), Err(ValidationError::Schema { .. })));
    }

    #[test]
    fn test_blank_text_is_schema_error() {
        for field in ["phone_number", "user_name", "email"] {
            let mut record = sample();
            record.insert(field.to_string(), json!("  "));
            assert_eq!(
                validate(&record),
                Err(ValidationError::Schema {
                    field: field.to_string()
                })
            );
        }
    }

    #[test]
    fn test_blank_phones_are_rejected_not_indexed() {
        let mut first = sample();
        first.insert("phone_number".to_string(), json!(""));
        let mut second = sample();
        second.insert("transaction_id".to_string(), json!("tx_0002"));
        second.insert("phone_number".to_string(), json!(""));

        let report = validate_batch(vec![first, second, sample()]);

        assert_eq!(report.valid_count(), 1);
        assert_eq!(report.invalid_count(), 2);
        for rejected in &report.invalid {
            assert_eq!(rejected.error.field(), "phone_number");
        }
    }

    #[test]
    fn test_bad_date_is_format_error() {
        let mut record = sample();
        record.insert("transaction_date".to_string(), json!("15/03/2024"));
        let err = validate(&record).unwrap_err();
        assert!(matches!(err, ValidationError::Format { .. }));
        assert_eq!(err.field(), "transaction_date");
    }

    #[test]
    fn test_negative_amount_is_range_error() {
        for field in ["original_amount", "discount_amount", "final_amount"] {
            let mut record = sample();
            record.insert(field.to_string(), json!(-1.0));
            let err = validate(&record).unwrap_err();
            assert!(matches!(err, ValidationError::Range { .. }));
            assert_eq!(err.field(), field);
        }
    }

    #[test]
    fn test_items_count_below_one_is_range_error() {
        let mut record = sample();
        record.insert("items_count".to_string(), json!(0));
        let err = validate(&record).unwrap_err();
        assert!(matches!(err, ValidationError::Range { .. }));
        assert_eq!(err.field(), "items_count");
    }

    #[test]
    fn test_zero_amounts_are_valid() {
        let mut record = sample();
        record.insert("original_amount".to_string(), json!(0));
        record.insert("discount_amount".to_string(), json!(0));
        record.insert("final_amount".to_string(), json!(0));
        assert!(validate(&record).is_ok());
    }

    #[test]
    fn test_batch_partitions_without_failing() {
        let mut bad_date = sample();
        bad_date.insert("transaction_id".to_string(), json!("tx_bad"));
        bad_date.insert("transaction_date".to_string(), json!("yesterday"));

        let mut missing = sample();
        missing.remove("merchant");

        let report = validate_batch(vec![sample(), bad_date.clone(), missing]);

        assert_eq!(report.valid_count(), 1);
        assert_eq!(report.invalid_count(), 2);
        assert!(!report.is_clean());
        assert_eq!(report.invalid[0].record, bad_date);
        assert!(report.invalid[0].message().contains("transaction_date"));
        assert!(report.invalid[1].message().contains("merchant"));
    }
}
