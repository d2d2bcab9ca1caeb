//! Names of the atomic fraud rules

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An atomic rule evaluated by the scorer.
///
/// Variant order is evaluation order; `triggered_rules` in a result follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    FraudulentVendorName,
    HighDiscountRatio,
    SamePhoneMultipleAccounts,
    SameUserNameMultipleAccounts,
}

impl Rule {
    /// All rules in evaluation order
    pub const ALL: [Rule; 4] = [
        Rule::FraudulentVendorName,
        Rule::HighDiscountRatio,
        Rule::SamePhoneMultipleAccounts,
        Rule::SameUserNameMultipleAccounts,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Rule::FraudulentVendorName => "fraudulent_vendor_name",
            Rule::HighDiscountRatio => "high_discount_ratio",
            Rule::SamePhoneMultipleAccounts => "same_phone_multiple_accounts",
            Rule::SameUserNameMultipleAccounts => "same_user_name_multiple_accounts",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Rule::ALL
            .into_iter()
            .find(|rule| rule.as_str() == s)
            .ok_or_else(|| format!("unknown rule `{}`", s))
    }
}
