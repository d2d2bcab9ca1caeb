//! Duplicate-identity indexing.
//!
//! Counts how often each phone number and user name occurs in the
//! collection handed to it. Identity reuse across separate submissions is
//! tracked by the caller holding on to an index and folding it into the next
//! one; nothing here keeps state between calls.

use crate::types::transaction::Transaction;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Occurrence counts for one transaction's identity fields (self-inclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DuplicateCounts {
    pub phone_number_count: usize,
    pub user_name_count: usize,
}

/// A transaction annotated with its duplicate counts
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexedTransaction {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub phone_number_count: usize,
    pub user_name_count: usize,
    /// `None` when the original amount is zero
    pub discount_ratio: Option<f64>,
}

impl IndexedTransaction {
    pub fn counts(&self) -> DuplicateCounts {
        DuplicateCounts {
            phone_number_count: self.phone_number_count,
            user_name_count: self.user_name_count,
        }
    }
}

/// Phone number and user name occurrence counts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateIndex {
    phone_counts: HashMap<String, usize>,
    name_counts: HashMap<String, usize>,
}

impl DuplicateIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Count identities over exactly the supplied transactions
    pub fn build(transactions: &[Transaction]) -> Self {
        let mut index = Self::new();
        index.extend(transactions);
        index
    }

    /// Count identities over `transactions` on top of caller-held history
    pub fn with_history(history: &DuplicateIndex, transactions: &[Transaction]) -> Self {
        let mut index = history.clone();
        index.extend(transactions);
        index
    }

    /// Record more transactions in this index
    pub fn extend(&mut self, transactions: &[Transaction]) {
        for tx in transactions {
            *self.phone_counts.entry(tx.phone_number.clone()).or_insert(0) += 1;
            *self.name_counts.entry(tx.user_name.clone()).or_insert(0) += 1;
        }
    }

    /// Fold another index's counts into this one
    pub fn absorb(&mut self, other: &DuplicateIndex) {
        for (phone, count) in &other.phone_counts {
            *self.phone_counts.entry(phone.clone()).or_insert(0) += count;
        }
        for (name, count) in &other.name_counts {
            *self.name_counts.entry(name.clone()).or_insert(0) += count;
        }
    }

    /// Occurrences of a phone number
    pub fn phone_count(&self, phone_number: &str) -> usize {
        self.phone_counts.get(phone_number).copied().unwrap_or(0)
    }

    /// Occurrences of a user name
    pub fn name_count(&self, user_name: &str) -> usize {
        self.name_counts.get(user_name).copied().unwrap_or(0)
    }

    /// Counts for a transaction's own identity fields
    pub fn counts_for(&self, tx: &Transaction) -> DuplicateCounts {
        DuplicateCounts {
            phone_number_count: self.phone_count(&tx.phone_number),
            user_name_count: self.name_count(&tx.user_name),
        }
    }

    /// Annotate transactions with their counts from this index
    pub fn annotate(&self, transactions: &[Transaction]) -> Vec<IndexedTransaction> {
        transactions
            .iter()
            .map(|tx| {
                let counts = self.counts_for(tx);
                IndexedTransaction {
                    transaction: tx.clone(),
                    phone_number_count: counts.phone_number_count,
                    user_name_count: counts.user_name_count,
                    discount_ratio: tx.discount_ratio(),
                }
            })
            .collect()
    }

    pub fn phone_counts(&self) -> &HashMap<String, usize> {
        &self.phone_counts
    }

    pub fn name_counts(&self) -> &HashMap<String, usize> {
        &self.name_counts
    }

    pub fn unique_phones(&self) -> usize {
        self.phone_counts.len()
    }

    pub fn unique_names(&self) -> usize {
        self.name_counts.len()
    }
}
