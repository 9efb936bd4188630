//! Synthetic transaction generation for demos and tests.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use rand::prelude::*;
use rand::rngs::StdRng;

use expense_core::models::{RawTable, AMOUNT, CATEGORY, PROVIDER, TIMESTAMP};
use expense_core::{ExpenseError, Result};

pub const PROVIDERS: [&str; 10] = [
    "Amazon",
    "Starbucks",
    "Walmart",
    "Target",
    "Uber",
    "Lyft",
    "Shell",
    "Chevron",
    "Whole Foods",
    "Apple",
];

pub const CATEGORIES: [&str; 10] = [
    "Groceries",
    "Transport",
    "Entertainment",
    "Utilities",
    "Dining",
    "Subscription",
    "Healthcare",
    "Rent",
    "Shopping",
    "Travel",
];

const MIN_AMOUNT: f64 = 3.0;
const MAX_AMOUNT: f64 = 500.0;

/// Parameters for [`generate_transactions`].
#[derive(Debug, Clone, PartialEq)]
pub struct SampleConfig {
    pub count: usize,
    /// Earliest timestamp, midnight of this day.
    pub start: NaiveDate,
    /// Latest timestamp, midnight of this day.
    pub end: NaiveDate,
    pub seed: u64,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            count: 100,
            start: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or_default(),
            end: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap_or_default(),
            seed: 42,
        }
    }
}

/// Generate `config.count` random transactions as a raw table with
/// `amount`, `timestamp`, `provider` and `category` columns.
///
/// Amounts are uniform in [3, 500] rounded to cents and timestamps uniform
/// over the configured range. The same seed always yields the same table.
pub fn generate_transactions(config: &SampleConfig) -> Result<RawTable> {
    if config.count == 0 {
        return Err(ExpenseError::InvalidSample(
            "sample count must be > 0".to_string(),
        ));
    }
    if config.end <= config.start {
        return Err(ExpenseError::InvalidSample(format!(
            "end date {} must be after start date {}",
            config.end, config.start
        )));
    }

    let start = NaiveDateTime::new(config.start, NaiveTime::MIN);
    let end = NaiveDateTime::new(config.end, NaiveTime::MIN);
    let span_secs = (end - start).num_seconds();

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut table = RawTable::new(&[AMOUNT, TIMESTAMP, PROVIDER, CATEGORY], Vec::new());

    for _ in 0..config.count {
        let amount = (rng.gen_range(MIN_AMOUNT..=MAX_AMOUNT) * 100.0).round() / 100.0;
        let at = start + Duration::seconds(rng.gen_range(0..=span_secs));
        let provider = PROVIDERS[rng.gen_range(0..PROVIDERS.len())];
        let category = CATEGORIES[rng.gen_range(0..CATEGORIES.len())];

        table.push_row(vec![
            format!("{:.2}", amount),
            at.format("%Y-%m-%dT%H:%M:%S").to_string(),
            provider.to_string(),
            category.to_string(),
        ]);
    }

    Ok(table)
}
