//! Coupon redemption transaction data structures

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Untyped record as it arrives from CSV or JSON input
pub type RawRecord = serde_json::Map<String, serde_json::Value>;

/// Sales channel of a redemption
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Channel {
    Online,
    InStore,
}

impl Channel {
    /// Parse the wire representation (`online` or `in-store`)
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "online" => Some(Channel::Online),
            "in-store" => Some(Channel::InStore),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Online => "online",
            Channel::InStore => "in-store",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated coupon redemption
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique transaction identifier
    pub transaction_id: String,

    pub user_id: String,

    /// Display name of the redeeming user
    pub user_name: String,

    pub email: String,

    /// Contact phone number
    pub phone_number: String,

    /// Calendar date of the redemption
    pub transaction_date: NaiveDate,

    /// Merchant the coupon was issued by
    pub merchant: String,

    /// Vendor that processed the redemption
    pub vendor_name: String,

    pub channel: Channel,

    /// Number of items in the basket (at least 1)
    pub items_count: u32,

    /// Basket value before discount
    pub original_amount: f64,

    /// Discount granted by the coupon
    pub discount_amount: f64,

    /// Amount actually paid
    pub final_amount: f64,

    pub coupon_code: String,

    /// Ground-truth label (1 = abuse), when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abuse: Option<u8>,
}

impl Transaction {
    /// Create a transaction with placeholder identity fields.
    ///
    /// Intended for tests and tooling; production records go through the validator.
    pub fn new(
        transaction_id: impl Into<String>,
        vendor_name: impl Into<String>,
        original_amount: f64,
        discount_amount: f64,
    ) -> Self {
        let transaction_id = transaction_id.into();
        Self {
            user_id: format!("user_{}", transaction_id),
            user_name: format!("name_{}", transaction_id),
            email: format!("{}@example.com", transaction_id),
            phone_number: format!("phone_{}", transaction_id),
            transaction_id,
            transaction_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or(NaiveDate::MIN),
            merchant: "StoreA".to_string(),
            vendor_name: vendor_name.into(),
            channel: Channel::Online,
            items_count: 1,
            original_amount,
            discount_amount,
            final_amount: (original_amount - discount_amount).max(0.0),
            coupon_code: "SAVE10".to_string(),
            abuse: None,
        }
    }

    /// Override the identity fields used for duplicate detection
    pub fn with_identity(mut self, user_name: impl Into<String>, phone_number: impl Into<String>) -> Self {
        self.user_name = user_name.into();
        self.phone_number = phone_number.into();
        self
    }

    /// Attach a ground-truth label
    pub fn with_label(mut self, abuse: bool) -> Self {
        self.abuse = Some(u8::from(abuse));
        self
    }

    /// Share of the basket covered by the discount.
    ///
    /// `None` when the original amount is zero, since the ratio is undefined.
    pub fn discount_ratio(&self) -> Option<f64> {
        if self.original_amount == 0.0 {
            None
        } else {
            Some(self.discount_amount / self.original_amount)
        }
    }

    /// True when the transaction carries the abuse label
    pub fn is_labelled_abuse(&self) -> Option<bool> {
        self.abuse.map(|label| label == 1)
    }
}
