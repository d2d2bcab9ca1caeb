//! Synthetic Coupon Dataset Generator
//!
//! Writes a labelled coupon redemption dataset for exercising the detector.
//! Abusive rows share a small pool of names and phone numbers, go through
//! fraudulent vendors and carry 50-100% discounts.
//!
//! Usage: generate_dataset [output.csv|output.json] [count] [abuse_rate]

use chrono::{Duration, Local, NaiveDate};
use coupon_abuse_detector::{
    loader,
    rules::config::default_fraudulent_vendors,
    types::{Channel, Transaction},
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::info;

const SEED: u64 = 42;
const DATE_RANGE_DAYS: i64 = 30;

const MERCHANTS: &[&str] = &["StoreA", "StoreB", "StoreC", "StoreD", "StoreE"];
const COUPON_CODES: &[&str] = &["SAVE10", "SAVE20", "FREESHIP", "WELCOME", "HOLIDAY50"];
const FIRST_NAMES: &[&str] = &[
    "Alice", "Bob", "Carol", "David", "Eva", "Frank", "Grace", "Henry", "Ivy", "John",
];
const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Miller", "Davis", "Wilson",
];
const DOMAINS: &[&str] = &["example.com", "test.com", "mail.com"];

/// Identity attached to a generated redemption
#[derive(Debug, Clone)]
struct Identity {
    user_name: String,
    email: String,
    phone_number: String,
}

/// Seeded generator for labelled coupon redemptions
struct TransactionGenerator {
    rng: StdRng,
    today: NaiveDate,
    fraudulent_vendors: Vec<String>,
    transaction_counter: u64,
}

impl TransactionGenerator {
    fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            today: Local::now().date_naive(),
            fraudulent_vendors: default_fraudulent_vendors(),
            transaction_counter: 0,
        }
    }

    fn phone(&mut self) -> String {
        format!("+27{}", self.rng.gen_range(600_000_000..=699_999_999u32))
    }

    fn full_name(&mut self) -> String {
        format!(
            "{} {}",
            self.random_choice(FIRST_NAMES),
            self.random_choice(LAST_NAMES)
        )
    }

    /// One distinct identity per clean redemption
    fn unique_identities(&mut self, count: usize) -> Vec<Identity> {
        (0..count)
            .map(|i| {
                let user_name = format!("{}_{}", self.full_name(), i);
                let email = format!(
                    "{}@{}",
                    user_name.to_lowercase().replace(' ', "."),
                    self.random_choice(DOMAINS)
                );
                Identity {
                    user_name,
                    email,
                    phone_number: self.phone(),
                }
            })
            .collect()
    }

    /// Small shared pool reused by abusive redemptions
    fn duplicate_pool(&mut self, count: usize) -> Vec<Identity> {
        (0..count.max(1))
            .map(|_| Identity {
                user_name: self.full_name(),
                email: format!(
                    "fraud{}@{}",
                    self.rng.gen_range(1..=100),
                    self.random_choice(DOMAINS)
                ),
                phone_number: self.phone(),
            })
            .collect()
    }

    fn generate(&mut self, identity: Identity, abuse: bool) -> Transaction {
        self.transaction_counter += 1;

        let original_amount = round2(self.rng.gen_range(20.0..300.0));
        let (vendor_name, discount_share) = if abuse {
            let vendor = self.fraudulent_vendors[self.rng.gen_range(0..self.fraudulent_vendors.len())].clone();
            (vendor, self.rng.gen_range(0.5..=1.0))
        } else {
            (self.random_choice(MERCHANTS).to_string(), self.rng.gen_range(0.05..0.3))
        };
        let discount_amount = round2(original_amount * discount_share);

        Transaction {
            transaction_id: format!("tx_{:04}", self.transaction_counter),
            user_id: format!("user_{:03}", self.rng.gen_range(1..=100)),
            user_name: identity.user_name,
            email: identity.email,
            phone_number: identity.phone_number,
            transaction_date: self.today - Duration::days(self.rng.gen_range(0..=DATE_RANGE_DAYS)),
            merchant: self.random_choice(MERCHANTS).to_string(),
            vendor_name,
            channel: if self.rng.gen_bool(0.5) {
                Channel::Online
            } else {
                Channel::InStore
            },
            items_count: self.rng.gen_range(1..=5),
            original_amount,
            discount_amount,
            final_amount: round2(original_amount - discount_amount),
            coupon_code: self.random_choice(COUPON_CODES).to_string(),
            abuse: Some(u8::from(abuse)),
        }
    }

    /// Exactly `floor(count * abuse_rate)` abusive rows, shuffled in with the rest
    fn generate_dataset(&mut self, count: usize, abuse_rate: f64) -> Vec<Transaction> {
        let n_abuse = (count as f64 * abuse_rate) as usize;
        let n_clean = count - n_abuse;

        let mut unique = self.unique_identities(n_clean);
        let duplicates = self.duplicate_pool(n_abuse / 3);

        let mut rows: Vec<Transaction> = Vec::with_capacity(count);
        for i in 0..count {
            let abuse = i < n_abuse;
            let identity = if abuse {
                duplicates[self.rng.gen_range(0..duplicates.len())].clone()
            } else {
                match unique.pop() {
                    Some(identity) => identity,
                    None => break,
                }
            };
            rows.push(self.generate(identity, abuse));
        }

        rows.shuffle(&mut self.rng);
        rows
    }

    fn random_choice<'a>(&mut self, choices: &[&'a str]) -> &'a str {
        choices[self.rng.gen_range(0..choices.len())]
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn write_csv(path: &str, rows: &[Transaction]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("generate_dataset=info".parse()?),
        )
        .init();

    info!("Starting Synthetic Dataset Generator");

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let output = args
        .get(1)
        .map(|s| s.as_str())
        .unwrap_or("data/coupon_abuse_full_with_users.csv");
    let count: usize = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(150);
    let abuse_rate: f64 = args
        .get(3)
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(0.3)
        .clamp(0.0, 1.0);

    info!(
        output = %output,
        count = count,
        abuse_rate = abuse_rate,
        seed = SEED,
        "Configuration loaded"
    );

    if let Some(parent) = std::path::Path::new(output).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut generator = TransactionGenerator::new(SEED);
    let rows = generator.generate_dataset(count, abuse_rate);
    let abusive = rows.iter().filter(|tx| tx.abuse == Some(1)).count();

    if output.ends_with(".json") {
        loader::write_report(output, &rows)?;
    } else {
        write_csv(output, &rows)?;
    }

    info!(
        "Completed! Wrote {} transactions ({} clean, {} abusive) to {}",
        rows.len(),
        rows.len() - abusive,
        abusive,
        output
    );

    Ok(())
}
