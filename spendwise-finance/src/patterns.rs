//! Behavioral spending patterns over a trailing window: when money goes
//! out, where it goes, and which weeks spike.
//!
//! The profile is numbers and category labels only. Turning it into prose
//! is left to [`crate::narrative`].

use serde::Serialize;
use spendwise_core::{
    is_late_night, is_weekend, round1, week_bucket_key, Category, CategoryMap, Transaction,
};
use std::collections::HashMap;

/// A week bucket spends more than this multiple of the average to count as a spike.
pub const SPIKE_FACTOR: f64 = 1.5;

/// A week whose debit total stands out from the window's average.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendSpike {
    pub week_key: String,
    pub amount: f64,
}

/// Debit totals per week bucket, in the order buckets first appear.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeeklySpend {
    index: HashMap<String, usize>,
    buckets: Vec<(String, f64)>,
}

impl WeeklySpend {
    /// Open the bucket for `key` if needed and add `amount` to it.
    pub fn add(&mut self, key: String, amount: f64) {
        match self.index.get(&key) {
            Some(&i) => self.buckets[i].1 += amount,
            None => {
                self.index.insert(key.clone(), self.buckets.len());
                self.buckets.push((key, amount));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.index.get(key).map(|&i| self.buckets[i].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.buckets.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Mean bucket total, 0 with no buckets.
    pub fn average(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        self.iter().map(|(_, v)| v).sum::<f64>() / self.len() as f64
    }

    /// Buckets above `average × SPIKE_FACTOR`, in discovery order.
    pub fn spikes(&self, average: f64) -> Vec<SpendSpike> {
        let threshold = average * SPIKE_FACTOR;
        self.buckets
            .iter()
            .filter(|(_, amount)| *amount > threshold)
            .map(|(week_key, amount)| SpendSpike {
                week_key: week_key.clone(),
                amount: *amount,
            })
            .collect()
    }
}

impl Serialize for WeeklySpend {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

/// Output of [`analyze_pattern`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendingProfile {
    pub total_credit: f64,
    pub total_debit: f64,
    pub transaction_count: usize,
    /// Occurrences per category, debits and credits alike
    pub category_frequency: CategoryMap<usize>,
    /// Debit amount per category
    pub category_spend: CategoryMap<f64>,
    pub weekend_count: usize,
    pub weekday_count: usize,
    pub late_night_count: usize,
    pub weekly_spend: WeeklySpend,
    pub most_frequent_category: Category,
    pub biggest_spend_category: Category,
    pub biggest_spend_amount: f64,
    pub average_weekly_spend: f64,
    pub spending_spikes: Vec<SpendSpike>,
    /// Weekend share of transactions, percent with one decimal
    pub weekend_ratio: f64,
    pub monthly_income: f64,
    pub savings_goal: f64,
}

/// Analyze a window of transactions in one pass.
///
/// Window length is the caller's choice. Every transaction opens its week
/// bucket; only debits add to it.
pub fn analyze_pattern(transactions: &[Transaction], income: f64, savings_goal: f64) -> SpendingProfile {
    let mut total_credit = 0.0;
    let mut total_debit = 0.0;
    let mut category_frequency: CategoryMap<usize> = CategoryMap::new();
    let mut category_spend: CategoryMap<f64> = CategoryMap::new();
    let mut weekend_count = 0;
    let mut weekday_count = 0;
    let mut late_night_count = 0;
    let mut weekly_spend = WeeklySpend::default();

    for txn in transactions {
        let debit = if txn.is_debit() { txn.amount } else { 0.0 };
        if txn.is_debit() {
            total_debit += txn.amount;
            *category_spend.get_or_insert_with(txn.category, || 0.0) += txn.amount;
        } else {
            total_credit += txn.amount;
        }

        *category_frequency.get_or_insert_with(txn.category, || 0) += 1;

        if is_weekend(txn.timestamp) {
            weekend_count += 1;
        } else {
            weekday_count += 1;
        }

        if is_late_night(txn.timestamp) {
            late_night_count += 1;
        }

        weekly_spend.add(week_bucket_key(txn.timestamp.date()), debit);
    }

    let most_frequent_category = category_frequency
        .first_max_by(|n| *n)
        .map(|(c, _)| c)
        .unwrap_or(Category::Other);

    let (biggest_spend_category, biggest_spend_amount) = category_spend
        .first_max_by(|amount| *amount)
        .map(|(c, amount)| (c, *amount))
        .unwrap_or((Category::Other, 0.0));

    let average_weekly_spend = weekly_spend.average();
    let spending_spikes = weekly_spend.spikes(average_weekly_spend);

    let transaction_count = transactions.len();
    let weekend_ratio = if transaction_count > 0 {
        round1(weekend_count as f64 / transaction_count as f64 * 100.0)
    } else {
        0.0
    };

    tracing::debug!(
        transaction_count,
        weeks = weekly_spend.len(),
        spikes = spending_spikes.len(),
        "analyzed spending pattern"
    );

    SpendingProfile {
        total_credit,
        total_debit,
        transaction_count,
        category_frequency,
        category_spend,
        weekend_count,
        weekday_count,
        late_night_count,
        weekly_spend,
        most_frequent_category,
        biggest_spend_category,
        biggest_spend_amount,
        average_weekly_spend,
        spending_spikes,
        weekend_ratio,
        monthly_income: income,
        savings_goal,
    }
}
