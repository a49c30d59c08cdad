//! Most-active record reconciliation
//!
//! A batch run downloads fresh records and merges them against the persisted
//! history. Disagreement between the two on any (product, date) key aborts
//! the whole run before a single byte of the live file changes; absent
//! conflicts, the merge is a keep-last dedup over `old + new`.

use chrono::NaiveDate;
use std::collections::HashMap;
use std::fmt;

use crate::constants::DATE_DIR_FORMAT;
use crate::error::{Error, Result};
use crate::models::{MostActiveRecord, Product, Ticker};

/// One (product, date) key on which old and new records disagree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordConflict {
    pub product: Product,
    pub date: NaiveDate,
    pub old_ticker: Ticker,
    pub new_ticker: Ticker,
}

impl fmt::Display for RecordConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{}: file has {}, download has {}",
            self.product.name(),
            self.date.format(DATE_DIR_FORMAT),
            self.old_ticker.name(),
            self.new_ticker.name()
        )
    }
}

/// Operator alert channel for fatal conflicts
///
/// The original toolchain popped a desktop warning board; anything that gets
/// an operator's attention fits here.
pub trait ConflictNotifier {
    fn notify(&self, message: &str);
}

/// Notifier that raises the alert through the error log
#[derive(Debug, Default)]
pub struct LogNotifier;

impl ConflictNotifier for LogNotifier {
    fn notify(&self, message: &str) {
        tracing::error!("OPERATOR ALERT: {}", message);
    }
}

/// Every key where a new record contradicts a persisted one
///
/// A new record whose key is absent from `old`, or that matches the old
/// ticker, is not a conflict.
pub fn find_conflicts(
    old: &[MostActiveRecord],
    new: &[MostActiveRecord],
) -> Vec<RecordConflict> {
    let old_by_key: HashMap<(Product, NaiveDate), &Ticker> =
        old.iter().map(|r| (r.key(), &r.ticker)).collect();

    new.iter()
        .filter_map(|record| {
            let old_ticker = *old_by_key.get(&record.key())?;
            if *old_ticker != record.ticker {
                Some(RecordConflict {
                    product: record.product.clone(),
                    date: record.date,
                    old_ticker: old_ticker.clone(),
                    new_ticker: record.ticker.clone(),
                })
            } else {
                None
            }
        })
        .collect()
}

/// Keep-last dedup over `old + new`, one record per (product, date)
///
/// Later entries in the concatenation win, so a confirming download simply
/// replaces its identical persisted twin. Output is sorted by key; the
/// reduction is deterministic for a given input order.
pub fn merge(old: &[MostActiveRecord], new: &[MostActiveRecord]) -> Vec<MostActiveRecord> {
    let mut by_key: HashMap<(Product, NaiveDate), &MostActiveRecord> = HashMap::new();
    for record in old.iter().chain(new.iter()) {
        by_key.insert(record.key(), record);
    }
    let mut merged: Vec<MostActiveRecord> = by_key.into_values().cloned().collect();
    merged.sort_by(|a, b| (&a.product, a.date).cmp(&(&b.product, b.date)));
    merged
}

/// Check-then-merge; fatal on any conflict
///
/// Conflicts are logged pair by pair, raised to the notifier in one message,
/// and returned as an error carrying every pair. Nothing is merged or
/// written in that case.
pub fn reconcile(
    old: &[MostActiveRecord],
    new: &[MostActiveRecord],
    notifier: &dyn ConflictNotifier,
) -> Result<Vec<MostActiveRecord>> {
    let conflicts = find_conflicts(old, new);
    if !conflicts.is_empty() {
        for conflict in &conflicts {
            tracing::error!(
                product = %conflict.product.name(),
                date = %conflict.date.format(DATE_DIR_FORMAT),
                old = %conflict.old_ticker.name(),
                new = %conflict.new_ticker.name(),
                "Most-active record mismatch"
            );
        }
        let detail = conflicts
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        notifier.notify(&detail);
        return Err(Error::Conflict(detail));
    }
    Ok(merge(old, new))
}

/// Synthesize the far-month series from two ranked series
///
/// Per (product, date) key: a key present in only one series passes through;
/// a key present in both keeps the record whose ticker compares greater.
/// Contract-code order standing in for expiry distance is an assumption of
/// the ticker naming scheme, not something verified here.
pub fn gen_longer(
    rank1: &[MostActiveRecord],
    rank2: &[MostActiveRecord],
) -> Vec<MostActiveRecord> {
    let mut by_key: HashMap<(Product, NaiveDate), &MostActiveRecord> = HashMap::new();
    for record in rank1.iter().chain(rank2.iter()) {
        by_key
            .entry(record.key())
            .and_modify(|kept| {
                if record.ticker > kept.ticker {
                    *kept = record;
                }
            })
            .or_insert(record);
    }
    let mut longer: Vec<MostActiveRecord> = by_key.into_values().cloned().collect();
    longer.sort_by(|a, b| (&a.product, a.date).cmp(&(&b.product, b.date)));
    longer
}

/// Records dated `today`, for the same-day report
pub fn today_subset(records: &[MostActiveRecord], today: NaiveDate) -> Vec<MostActiveRecord> {
    records
        .iter()
        .filter(|r| r.date == today)
        .cloned()
        .collect()
}
