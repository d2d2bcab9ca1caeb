//! Coupon Abuse Detector - Main Entry Point
//!
//! Validates a transaction file, scores it as one batch, and when labels are
//! available computes classifier metrics and the next rule weight table.
//!
//! Usage: coupon-abuse-detector <input> [config.toml] [report.json]

use anyhow::{bail, Result};
use coupon_abuse_detector::{
    batch::{BatchEvaluator, BatchReport},
    config::{AppConfig, LoggingConfig},
    feedback::{self, FeedbackAnalysis},
    indexer::DuplicateIndex,
    loader,
    metrics::{self, ConfusionMetrics, GroundTruth},
    rules::{match_pattern, RuleConfig, RuleConfigStore},
    types::{RiskLevel, Transaction},
    validator::{self, InvalidRecord},
};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{info, warn};

/// Everything produced by one run
#[derive(Serialize)]
struct RunReport<'a> {
    valid_count: usize,
    invalid_count: usize,
    invalid_records: &'a [InvalidRecord],
    batch: &'a BatchReport,
    manual_review: &'a [ReviewItem],
    metrics: Option<&'a ConfusionMetrics>,
    feedback: Option<&'a FeedbackAnalysis>,
    next_rule_config: Option<&'a RuleConfig>,
}

/// A transaction queued for manual review, with the reason for each rule that fired
#[derive(Serialize)]
struct ReviewItem {
    transaction_id: String,
    fraud_score: f64,
    risk_level: RiskLevel,
    reasons: Vec<String>,
}

fn review_queue(report: &BatchReport, transactions: &[Transaction], rules: &RuleConfig) -> Vec<ReviewItem> {
    let annotated = DuplicateIndex::build(transactions).annotate(transactions);
    let by_id: HashMap<&str, _> = annotated
        .iter()
        .map(|indexed| (indexed.transaction.transaction_id.as_str(), indexed))
        .collect();

    report
        .manual_review_queue()
        .filter_map(|result| {
            let indexed = by_id.get(result.transaction_id.as_str())?;
            let reasons = result
                .triggered_rules
                .iter()
                .map(|rule| match_pattern(indexed, *rule, rules))
                .filter(|m| m.matched)
                .map(|m| m.explanation)
                .collect();
            Some(ReviewItem {
                transaction_id: result.transaction_id.clone(),
                fraud_score: result.fraud_score,
                risk_level: result.risk_level,
                reasons,
            })
        })
        .collect()
}

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(format!("coupon_abuse_detector={}", logging.level).parse()?);

    if logging.format == "json" {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    Ok(())
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let program = args.first().map(|s| s.as_str()).unwrap_or("coupon-abuse-detector");
    let Some(input_path) = args.get(1) else {
        bail!("usage: {} <input> [config.toml] [report.json]", program);
    };
    let config_path = args.get(2).map(|s| s.as_str()).unwrap_or("config/config.toml");
    let output_path = args.get(3).map(|s| s.as_str()).unwrap_or("fraud_report.json");

    // Load configuration
    let config = AppConfig::load_or_default(config_path)?;
    init_logging(&config.logging)?;

    info!("Starting Coupon Abuse Detector");
    info!(
        config = %config_path,
        fraudulent_vendors = ?config.detection.fraudulent_vendors,
        categories = config.rules.categories.len(),
        "Configuration loaded"
    );

    let store = RuleConfigStore::new(config.rule_config());

    // Validate
    let records = loader::load_records(input_path)?;
    let validation = validator::validate_batch(records);
    info!(
        valid = validation.valid_count(),
        invalid = validation.invalid_count(),
        "Validation complete"
    );
    for rejected in &validation.invalid {
        warn!(error = %rejected.message(), "Invalid record held for manual follow-up");
    }
    if validation.valid.is_empty() {
        bail!("No valid transactions in {}", input_path);
    }

    // Score
    let report = BatchEvaluator::from_store(&store).evaluate_batch(&validation.valid)?;
    report.log_summary();

    let manual_review = review_queue(&report, &validation.valid, &store.snapshot());
    info!(queued = manual_review.len(), "Manual review queue built");

    // Evaluate against labels
    let ground_truth = match &config.input.ground_truth_path {
        Some(path) => loader::load_ground_truth(path)?,
        None => GroundTruth::from_transactions(&validation.valid),
    };

    let (confusion, analysis, next_rules) = if ground_truth.is_empty() {
        info!("No ground-truth labels available, skipping metrics and feedback");
        (None, None, None)
    } else {
        let confusion = metrics::evaluate_results(&report.results, &ground_truth);
        confusion.log_summary();

        let analysis = feedback::analyze(&report.results, &ground_truth);
        let update = feedback::update_rule_weights(&store.snapshot(), &analysis.rule_effectiveness);
        for (category, old_weight, new_weight) in update.changes() {
            info!(
                category = %category,
                old_weight,
                new_weight,
                "Rule category weight adjusted"
            );
        }
        store.publish(update.updated.clone());

        (Some(confusion), Some(analysis), Some(update.updated))
    };

    loader::write_report(
        output_path,
        &RunReport {
            valid_count: validation.valid_count(),
            invalid_count: validation.invalid_count(),
            invalid_records: &validation.invalid,
            batch: &report,
            manual_review: &manual_review,
            metrics: confusion.as_ref(),
            feedback: analysis.as_ref(),
            next_rule_config: next_rules.as_ref(),
        },
    )?;

    info!(
        output = %output_path,
        rule_config_version = store.version(),
        "Run complete"
    );

    Ok(())
}
