//! Batch evaluation.
//!
//! Indexes identities once over the whole batch, then scores every
//! transaction against the same duplicate counts and the same rule
//! configuration snapshot.

use crate::error::{DetectionError, Result};
use crate::indexer::DuplicateIndex;
use crate::rules::config::{RuleConfig, RuleConfigStore};
use crate::rules::scorer::RuleScorer;
use crate::types::result::{BatchSummary, FraudResult, RiskLevel};
use crate::types::transaction::Transaction;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// A transaction whose scoring failed; the rest of the batch still ran
#[derive(Debug, Clone, Serialize)]
pub struct ScoringFailure {
    pub transaction_id: String,
    pub error: String,
}

/// Per-transaction results and roll-up of one batch
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub results: Vec<FraudResult>,
    pub summary: BatchSummary,
    pub failures: Vec<ScoringFailure>,
    /// Rule configuration version used for the whole batch
    pub config_version: u64,
}

impl BatchReport {
    /// Results grouped by risk level
    pub fn count_by_level(&self) -> BTreeMap<RiskLevel, usize> {
        let mut counts = BTreeMap::new();
        for result in &self.results {
            *counts.entry(result.risk_level).or_insert(0) += 1;
        }
        counts
    }

    /// Results that need human adjudication
    pub fn manual_review_queue(&self) -> impl Iterator<Item = &FraudResult> {
        self.results.iter().filter(|r| r.manual_review_required)
    }

    /// Print summary statistics
    pub fn log_summary(&self) {
        let summary = &self.summary;
        let by_level = self.count_by_level();

        info!("╔══════════════════════════════════════════════════════════════╗");
        info!("║            COUPON ABUSE DETECTION - BATCH SUMMARY            ║");
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Transactions: {:>8}  │  Rule config version: {:>6}       ║",
            summary.total_transactions, self.config_version
        );
        info!(
            "║ Flagged:      {:>8}  │  Flagged Rate:   {:>6.2}%          ║",
            summary.flagged_transactions, summary.flagged_percentage
        );
        info!(
            "║ High Risk:    {:>8}  │  High Risk Rate: {:>6.2}%          ║",
            summary.high_risk_transactions, summary.high_risk_percentage
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ Results by Risk Level:                                       ║");
        for (level, count) in &by_level {
            let pct = (*count as f64 / summary.total_transactions as f64) * 100.0;
            let bar: String = "█".repeat(((pct / 5.0) as usize).min(20));
            info!("║   {:10}: {:>6} ({:>5.1}%) {}", level.as_str(), count, pct, bar);
        }
        if !self.failures.is_empty() {
            info!("╠══════════════════════════════════════════════════════════════╣");
            info!("║ Scoring failures: {:>6}                                     ║", self.failures.len());
        }
        info!("╚══════════════════════════════════════════════════════════════╝");
    }
}

/// Runs the rule scorer over batches of transactions
#[derive(Debug, Clone)]
pub struct BatchEvaluator {
    config: Arc<RuleConfig>,
    history: Option<DuplicateIndex>,
}

impl BatchEvaluator {
    /// Evaluate with a fixed configuration snapshot
    pub fn new(config: Arc<RuleConfig>) -> Self {
        Self { config, history: None }
    }

    /// Evaluate with the store's current configuration
    pub fn from_store(store: &RuleConfigStore) -> Self {
        Self::new(store.snapshot())
    }

    /// Count identities from earlier submissions alongside each batch
    pub fn with_history(mut self, history: DuplicateIndex) -> Self {
        self.history = Some(history);
        self
    }

    /// Score a batch.
    ///
    /// Fails only for an empty batch. A transaction that cannot be scored is
    /// reported in `failures` and left out of `results`.
    pub fn evaluate_batch(&self, transactions: &[Transaction]) -> Result<BatchReport> {
        if transactions.is_empty() {
            return Err(DetectionError::EmptyBatch);
        }

        let start_time = Instant::now();
        let index = match &self.history {
            Some(history) => DuplicateIndex::with_history(history, transactions),
            None => DuplicateIndex::build(transactions),
        };
        let scorer = RuleScorer::new(Arc::clone(&self.config));

        let mut results = Vec::with_capacity(transactions.len());
        let mut failures = Vec::new();

        for tx in transactions {
            match scorer.score(tx, Some(index.counts_for(tx))) {
                Ok(result) => results.push(result),
                Err(e) => {
                    warn!(
                        transaction_id = %tx.transaction_id,
                        error = %e,
                        "Scoring failed, continuing with batch"
                    );
                    failures.push(ScoringFailure {
                        transaction_id: tx.transaction_id.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        let summary =
            BatchSummary::from_results(&results, transactions.len()).ok_or(DetectionError::EmptyBatch)?;

        info!(
            total = summary.total_transactions,
            flagged = summary.flagged_transactions,
            high_risk = summary.high_risk_transactions,
            failures = failures.len(),
            config_version = self.config.version,
            processing_time_us = start_time.elapsed().as_micros(),
            "Batch evaluated"
        );

        Ok(BatchReport {
            results,
            summary,
            failures,
            config_version: self.config.version,
        })
    }
}
