//! Source of freshly downloaded most-active records
//!
//! The production downloader talks to a database and is out of scope here;
//! the reconciliation run only needs something that yields records grouped
//! by rank (1 = most active, 2 = second). [`CsvSnapshotSource`] reads a
//! downloaded snapshot file so batch runs work without the DB client.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::constants::DATE_DIR_FORMAT;
use crate::error::{Error, Result};
use crate::models::{MostActiveRecord, Product, Ticker};

/// Ranked most-active records, keyed by rank
pub type RankedRecords = BTreeMap<u8, Vec<MostActiveRecord>>;

/// Collaborator that fetches newly produced most-active records
pub trait RecordSource {
    /// Records dated `start` or later, grouped by rank
    fn fetch(&self, start: NaiveDate) -> Result<RankedRecords>;
}

/// Record source backed by a snapshot CSV
///
/// Columns `rank,product,date,ticker` with a header row. Malformed rows are
/// fatal: the snapshot is the input of a run that must not guess.
#[derive(Debug, Clone)]
pub struct CsvSnapshotSource {
    path: PathBuf,
}

impl CsvSnapshotSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RecordSource for CsvSnapshotSource {
    fn fetch(&self, start: NaiveDate) -> Result<RankedRecords> {
        let mut reader = csv::Reader::from_path(&self.path).map_err(|e| {
            Error::Io(format!("Failed to open snapshot {}: {}", self.path.display(), e))
        })?;

        let mut ranked = RankedRecords::new();
        for (row_num, row) in reader.records().enumerate() {
            let row = row.map_err(|e| {
                Error::Parse(format!("{} row {}: {}", self.path.display(), row_num + 2, e))
            })?;
            if row.len() != 4 {
                return Err(Error::Parse(format!(
                    "{} row {}: expected 4 fields, got {}",
                    self.path.display(),
                    row_num + 2,
                    row.len()
                )));
            }
            let rank: u8 = row[0].parse().map_err(|e| {
                Error::Parse(format!(
                    "{} row {}: bad rank '{}': {}",
                    self.path.display(),
                    row_num + 2,
                    &row[0],
                    e
                ))
            })?;
            let product: Product = row[1].parse().map_err(|e: Error| {
                Error::Parse(format!("{} row {}: {}", self.path.display(), row_num + 2, e))
            })?;
            let date = NaiveDate::parse_from_str(&row[2], DATE_DIR_FORMAT).map_err(|e| {
                Error::Parse(format!(
                    "{} row {}: bad date '{}': {}",
                    self.path.display(),
                    row_num + 2,
                    &row[2],
                    e
                ))
            })?;
            let ticker: Ticker = row[3].parse().map_err(|e: Error| {
                Error::Parse(format!("{} row {}: {}", self.path.display(), row_num + 2, e))
            })?;

            if date >= start {
                ranked
                    .entry(rank)
                    .or_default()
                    .push(MostActiveRecord::new(product, date, ticker));
            }
        }
        Ok(ranked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_fetch_groups_by_rank_and_filters_by_start() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("snapshot.csv");
        fs::write(
            &path,
            "rank,product,date,ticker\n\
             1,SHFE.rb,20211011,SHFE.rb2201\n\
             2,SHFE.rb,20211011,SHFE.rb2205\n\
             1,SHFE.rb,20211008,SHFE.rb2201\n",
        )
        .unwrap();

        let source = CsvSnapshotSource::new(&path);
        let ranked = source.fetch(d(2021, 10, 11)).unwrap();
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[&1].len(), 1);
        assert_eq!(ranked[&2].len(), 1);
        assert_eq!(ranked[&1][0].ticker.name(), "SHFE.rb2201");
    }

    #[test]
    fn test_malformed_snapshot_row_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("snapshot.csv");
        fs::write(&path, "rank,product,date,ticker\nfirst,SHFE.rb,20211011,SHFE.rb2201\n")
            .unwrap();
        let source = CsvSnapshotSource::new(&path);
        assert!(matches!(source.fetch(d(2021, 1, 1)), Err(Error::Parse(_))));
    }
}
