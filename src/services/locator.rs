//! Bar-file lookup across asset-class partitions
//!
//! The bar tree is `<root>/BarData/60/<partition>/<YYYYMMDD>/<TICKER>.csv`
//! with the fixed partition list from [`crate::constants::PARTITIONS`]. The
//! locator only ever reads this tree.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::constants::{BAR_DATA_RELPATH, DATE_DIR_FORMAT, PARTITIONS};
use crate::models::{Product, SymbolRef, Ticker};
use crate::services::registry::MostActiveRegistry;

/// Resolves (symbol, date) queries to bar-file paths
#[derive(Debug, Clone)]
pub struct BarFileLocator {
    root: PathBuf,
}

impl BarFileLocator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn date_dir(&self, partition: &str, date: NaiveDate) -> PathBuf {
        self.root
            .join(BAR_DATA_RELPATH)
            .join(partition)
            .join(date.format(DATE_DIR_FORMAT).to_string())
    }

    /// Bar file for one ticker on one date
    ///
    /// Partitions are searched in their fixed order and the first existing
    /// file wins; a ticker duplicated across partitions never yields more
    /// than one candidate.
    pub fn file_for_ticker(&self, ticker: &Ticker, date: NaiveDate) -> Option<PathBuf> {
        let file_name = format!("{}.csv", ticker.name());
        PARTITIONS
            .iter()
            .map(|partition| self.date_dir(partition, date).join(&file_name))
            .find(|path| path.is_file())
    }

    /// All contract files of a product on one date
    ///
    /// Standing assumption: a product's contracts live entirely within one
    /// partition, so the scan stops at the first partition that yields any
    /// match. A product split across two partitions would only be seen in
    /// the earlier one; that layout is treated as an operator error, not
    /// auto-corrected here.
    pub fn files_for_product(&self, product: &Product, date: NaiveDate) -> Vec<PathBuf> {
        for &partition in PARTITIONS {
            let files: Vec<PathBuf> = self
                .ticker_files_for_date(date, Some(partition))
                .into_iter()
                .filter(|(ticker, _)| ticker.product == *product)
                .map(|(_, path)| path)
                .collect();
            if !files.is_empty() {
                return files;
            }
        }
        Vec::new()
    }

    /// All ticker files on an exchange for one date
    ///
    /// Unlike products, exchange membership is not assumed partition-local:
    /// every partition is scanned and the matches unioned.
    pub fn files_for_exchange(&self, exchange: &str, date: NaiveDate) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for &partition in PARTITIONS {
            for (ticker, path) in self.ticker_files_for_date(date, Some(partition)) {
                if ticker.exchange() == exchange {
                    files.push(path);
                }
            }
        }
        files
    }

    /// Every ticker file for a date, keyed by parsed ticker
    ///
    /// `partition` restricts the scan to one known partition; an unknown or
    /// absent name scans all of them. File names that do not parse back into
    /// a ticker are skipped with a warning rather than failing the listing.
    pub fn ticker_files_for_date(
        &self,
        date: NaiveDate,
        partition: Option<&str>,
    ) -> BTreeMap<Ticker, PathBuf> {
        let partitions: Vec<&str> = match partition {
            Some(name) if PARTITIONS.contains(&name) => vec![name],
            _ => PARTITIONS.to_vec(),
        };

        let mut files = BTreeMap::new();
        for partition in partitions {
            let dir = self.date_dir(partition, date);
            if !dir.is_dir() {
                continue;
            }
            let entries = match std::fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(dir = %dir.display(), "Failed to list date directory: {}", e);
                    continue;
                }
            };
            for entry in entries.filter_map(|e| e.ok()) {
                let path = entry.path();
                if !path.is_file() {
                    continue;
                }
                match ticker_from_path(&path) {
                    Some(ticker) => {
                        files.insert(ticker, path);
                    }
                    None => {
                        tracing::warn!(
                            file = %path.display(),
                            "Skipping bar file with unparseable name"
                        );
                    }
                }
            }
        }
        files
    }

    /// Bar files per trading date for a ticker, product or exchange
    ///
    /// Dates come from the calendar service; each maps to the files found
    /// for it (possibly none).
    pub fn bar_files_in_range(
        &self,
        symbol: &SymbolRef,
        dates: &[NaiveDate],
    ) -> BTreeMap<NaiveDate, Vec<PathBuf>> {
        let mut result = BTreeMap::new();
        for &date in dates {
            let files = match symbol {
                SymbolRef::Ticker(ticker) => {
                    self.file_for_ticker(ticker, date).into_iter().collect()
                }
                SymbolRef::Product(product) => self.files_for_product(product, date),
                SymbolRef::Exchange(exchange) => self.files_for_exchange(exchange, date),
            };
            result.insert(date, files);
        }
        result
    }

    /// Per-date file of the most-active contract of a product
    ///
    /// Dates without a registry entry, or whose contract file is missing,
    /// map to an empty list; both misses are routine.
    pub fn most_active_files_in_range(
        &self,
        product: &Product,
        dates: &[NaiveDate],
        registry: &MostActiveRegistry,
    ) -> BTreeMap<NaiveDate, Vec<PathBuf>> {
        let mut result = BTreeMap::new();
        for &date in dates {
            let files = registry
                .lookup(product, date)
                .and_then(|ticker| self.file_for_ticker(ticker, date))
                .into_iter()
                .collect();
            result.insert(date, files);
        }
        result
    }
}

/// Recover the ticker from a `<TICKER>.csv` bar-file path
pub fn ticker_from_path(path: &Path) -> Option<Ticker> {
    if path.extension().and_then(|e| e.to_str()) != Some("csv") {
        return None;
    }
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .and_then(|name| name.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn touch_bar_file(root: &Path, partition: &str, date: &str, name: &str) -> PathBuf {
        let dir = root.join(BAR_DATA_RELPATH).join(partition).join(date);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, "").unwrap();
        path
    }

    #[test]
    fn test_file_for_ticker_first_partition_wins() {
        let tmp = TempDir::new().unwrap();
        // Same ticker file planted in two partitions; Futures precedes Stocks
        let futures = touch_bar_file(tmp.path(), "Futures", "20211011", "SHFE.rb2110.csv");
        touch_bar_file(tmp.path(), "Stocks", "20211011", "SHFE.rb2110.csv");

        let locator = BarFileLocator::new(tmp.path());
        let ticker: Ticker = "SHFE.rb2110".parse().unwrap();
        assert_eq!(locator.file_for_ticker(&ticker, d(2021, 10, 11)), Some(futures));
    }

    #[test]
    fn test_file_for_ticker_absent() {
        let tmp = TempDir::new().unwrap();
        let locator = BarFileLocator::new(tmp.path());
        let ticker: Ticker = "SHFE.rb2110".parse().unwrap();
        assert_eq!(locator.file_for_ticker(&ticker, d(2021, 10, 11)), None);
    }

    #[test]
    fn test_files_for_product_stops_at_first_nonempty_partition() {
        let tmp = TempDir::new().unwrap();
        let a = touch_bar_file(tmp.path(), "Futures", "20211011", "SHFE.rb2110.csv");
        let b = touch_bar_file(tmp.path(), "Futures", "20211011", "SHFE.rb2201.csv");
        // Same product planted in a later partition must not be unioned in
        touch_bar_file(tmp.path(), "Stocks", "20211011", "SHFE.rb2205.csv");
        touch_bar_file(tmp.path(), "Futures", "20211011", "SHFE.cu2110.csv");

        let locator = BarFileLocator::new(tmp.path());
        let product = Product::new("SHFE", "rb");
        let mut files = locator.files_for_product(&product, d(2021, 10, 11));
        files.sort();
        assert_eq!(files, vec![a, b]);
    }

    #[test]
    fn test_files_for_exchange_scans_all_partitions() {
        let tmp = TempDir::new().unwrap();
        let a = touch_bar_file(tmp.path(), "Futures", "20211011", "SHFE.rb2110.csv");
        let b = touch_bar_file(tmp.path(), "Stocks", "20211011", "SHFE.ag2112.csv");
        touch_bar_file(tmp.path(), "Futures", "20211011", "DCE.i2201.csv");

        let locator = BarFileLocator::new(tmp.path());
        let mut files = locator.files_for_exchange("SHFE", d(2021, 10, 11));
        files.sort();
        let mut expected = vec![a, b];
        expected.sort();
        assert_eq!(files, expected);
    }

    #[test]
    fn test_ticker_files_for_date_skips_malformed_names() {
        let tmp = TempDir::new().unwrap();
        touch_bar_file(tmp.path(), "Futures", "20211011", "SHFE.rb2110.csv");
        touch_bar_file(tmp.path(), "Futures", "20211011", "notaticker.csv");
        touch_bar_file(tmp.path(), "Futures", "20211011", "README.txt");

        let locator = BarFileLocator::new(tmp.path());
        let files = locator.ticker_files_for_date(d(2021, 10, 11), None);
        assert_eq!(files.len(), 1);
        let ticker: Ticker = "SHFE.rb2110".parse().unwrap();
        assert!(files.contains_key(&ticker));
    }

    #[test]
    fn test_unknown_partition_filter_scans_everything() {
        let tmp = TempDir::new().unwrap();
        touch_bar_file(tmp.path(), "Futures", "20211011", "SHFE.rb2110.csv");
        touch_bar_file(tmp.path(), "Stocks", "20211011", "DCE.i2201.csv");

        let locator = BarFileLocator::new(tmp.path());
        let all = locator.ticker_files_for_date(d(2021, 10, 11), Some("NoSuchPartition"));
        assert_eq!(all.len(), 2);
        let only = locator.ticker_files_for_date(d(2021, 10, 11), Some("Stocks"));
        assert_eq!(only.len(), 1);
    }

    #[test]
    fn test_most_active_files_in_range() {
        use crate::services::registry::{write_records, MostActiveRegistry};
        use crate::models::MostActiveRecord;

        let tmp = TempDir::new().unwrap();
        let rb2201 = touch_bar_file(tmp.path(), "Futures", "20211011", "SHFE.rb2201.csv");
        touch_bar_file(tmp.path(), "Futures", "20211011", "SHFE.rb2110.csv");

        let registry_path = tmp.path().join("MostActiveTickers.csv");
        write_records(
            &registry_path,
            &[MostActiveRecord::new(
                "SHFE.rb".parse().unwrap(),
                d(2021, 10, 11),
                "SHFE.rb2201".parse().unwrap(),
            )],
        )
        .unwrap();
        let registry = MostActiveRegistry::load(&registry_path).unwrap();

        let locator = BarFileLocator::new(tmp.path());
        let product = Product::new("SHFE", "rb");
        let dates = [d(2021, 10, 11), d(2021, 10, 12)];
        let by_date = locator.most_active_files_in_range(&product, &dates, &registry);
        // The registered contract's file, not every contract of the product
        assert_eq!(by_date[&d(2021, 10, 11)], vec![rb2201]);
        // No registry entry for the second date
        assert!(by_date[&d(2021, 10, 12)].is_empty());
    }

    #[test]
    fn test_bar_files_in_range_dispatch() {
        let tmp = TempDir::new().unwrap();
        let rb = touch_bar_file(tmp.path(), "Futures", "20211011", "SHFE.rb2110.csv");
        touch_bar_file(tmp.path(), "Futures", "20211012", "SHFE.rb2110.csv");

        let locator = BarFileLocator::new(tmp.path());
        let ticker: Ticker = "SHFE.rb2110".parse().unwrap();
        let dates = [d(2021, 10, 11), d(2021, 10, 13)];
        let by_date = locator.bar_files_in_range(&SymbolRef::Ticker(ticker), &dates);
        assert_eq!(by_date[&d(2021, 10, 11)], vec![rb]);
        assert!(by_date[&d(2021, 10, 13)].is_empty());
    }
}
