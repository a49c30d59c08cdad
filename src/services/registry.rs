//! Most-active-ticker registry: file round-trip, lookup, per-root cache
//!
//! The registry file is the only mutable file this crate owns. Writes follow
//! read → merge → backup-old → atomic-replace; see
//! [`backup_and_replace`].

use chrono::{NaiveDate, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use crate::constants::{BACKUP_TIMESTAMP_FORMAT, DATE_DIR_FORMAT, MOST_ACTIVE_FILE_RELPATH};
use crate::error::{Error, Result};
use crate::models::{MostActiveRecord, Product, Ticker};

const HEADER: [&str; 3] = ["product", "date", "ticker"];

/// Read a most-active record file, preserving row order
///
/// A missing file is an error; callers that tolerate absence check first.
/// Malformed rows are fatal: the registry is configuration, not scan input.
pub fn read_records(path: &Path) -> Result<Vec<MostActiveRecord>> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| Error::Config(format!("Failed to open {}: {}", path.display(), e)))?;

    let mut records = Vec::new();
    for (row_num, row) in reader.records().enumerate() {
        let row = row.map_err(|e| {
            Error::Config(format!("{} row {}: {}", path.display(), row_num + 2, e))
        })?;
        if row.len() != HEADER.len() {
            return Err(Error::Config(format!(
                "{} row {}: expected {} fields, got {}",
                path.display(),
                row_num + 2,
                HEADER.len(),
                row.len()
            )));
        }
        let product: Product = row[0].parse().map_err(|e: Error| {
            Error::Config(format!("{} row {}: {}", path.display(), row_num + 2, e))
        })?;
        let date = NaiveDate::parse_from_str(&row[1], DATE_DIR_FORMAT).map_err(|e| {
            Error::Config(format!(
                "{} row {}: bad date '{}': {}",
                path.display(),
                row_num + 2,
                &row[1],
                e
            ))
        })?;
        let ticker: Ticker = row[2].parse().map_err(|e: Error| {
            Error::Config(format!("{} row {}: {}", path.display(), row_num + 2, e))
        })?;
        records.push(MostActiveRecord::new(product, date, ticker));
    }
    Ok(records)
}

/// Write a record file sorted by (product, date)
///
/// Sorting makes the on-disk order a function of the record set alone, so a
/// re-read reproduces exactly what was written.
pub fn write_records(path: &Path, records: &[MostActiveRecord]) -> Result<()> {
    let mut sorted: Vec<&MostActiveRecord> = records.iter().collect();
    sorted.sort_by(|a, b| (&a.product, a.date).cmp(&(&b.product, b.date)));

    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| Error::Io(format!("Failed to create {}: {}", path.display(), e)))?;
    writer.write_record(HEADER)?;
    for record in sorted {
        writer.write_record([
            record.product.name(),
            record.date.format(DATE_DIR_FORMAT).to_string(),
            record.ticker.name(),
        ])?;
    }
    writer
        .flush()
        .map_err(|e| Error::Io(format!("Failed to flush {}: {}", path.display(), e)))?;
    Ok(())
}

/// Back up the live file, then atomically replace it with `records`
///
/// The backup copies the *previous* content under a timestamped name next to
/// the live file, before anything is overwritten; the new content lands via
/// a temp-file rename. Returns the backup path when one was made.
pub fn backup_and_replace(path: &Path, records: &[MostActiveRecord]) -> Result<Option<PathBuf>> {
    let backup = if path.is_file() {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| Error::Io(format!("Bad registry path: {}", path.display())))?;
        let timestamp = Utc::now().format(BACKUP_TIMESTAMP_FORMAT);
        let backup_path = path.with_file_name(format!("{}_{}.csv", stem, timestamp));
        std::fs::copy(path, &backup_path).map_err(|e| {
            Error::Io(format!("Failed to back up {}: {}", path.display(), e))
        })?;
        Some(backup_path)
    } else {
        None
    };

    let tmp_path = path.with_extension("csv.tmp");
    write_records(&tmp_path, records)?;
    std::fs::rename(&tmp_path, path).map_err(|e| {
        Error::Io(format!("Failed to replace {}: {}", path.display(), e))
    })?;
    Ok(backup)
}

/// Loaded (product, date) -> most-active ticker table
#[derive(Debug)]
pub struct MostActiveRegistry {
    path: PathBuf,
    table: HashMap<(Product, NaiveDate), Ticker>,
}

impl MostActiveRegistry {
    /// Load a registry file; conflicting duplicate keys are fatal
    pub fn load(path: &Path) -> Result<Self> {
        let records = read_records(path)?;
        let mut table = HashMap::with_capacity(records.len());
        for record in records {
            let key = record.key();
            if let Some(existing) = table.get(&key) {
                if *existing != record.ticker {
                    return Err(Error::Config(format!(
                        "{}: duplicate key {},{} with different tickers",
                        path.display(),
                        key.0.name(),
                        key.1.format(DATE_DIR_FORMAT)
                    )));
                }
            }
            table.insert(key, record.ticker);
        }
        Ok(Self {
            path: path.to_path_buf(),
            table,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Most-active ticker for a product on a date; misses are routine
    pub fn lookup(&self, product: &Product, date: NaiveDate) -> Option<&Ticker> {
        self.table.get(&(product.clone(), date))
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Record set, sorted by key
    pub fn records(&self) -> Vec<MostActiveRecord> {
        let mut records: Vec<MostActiveRecord> = self
            .table
            .iter()
            .map(|((product, date), ticker)| {
                MostActiveRecord::new(product.clone(), *date, ticker.clone())
            })
            .collect();
        records.sort_by(|a, b| (&a.product, a.date).cmp(&(&b.product, b.date)));
        records
    }

    /// Distinct products, sorted
    pub fn products(&self) -> Vec<Product> {
        let mut products: Vec<Product> =
            self.table.keys().map(|(product, _)| product.clone()).collect();
        products.sort();
        products.dedup();
        products
    }

    /// (earliest, latest) record date
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let mut dates = self.table.keys().map(|(_, date)| *date);
        let first = dates.next()?;
        Some(dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d))))
    }
}

/// Process-wide one-registry-per-root cache
///
/// Two independently loaded views of the same registry file could diverge
/// once one of them is rewritten, so every access for a given root goes
/// through the shared instance created on first request. The cache is
/// explicit and inspectable; `reset` exists for tests and is never called on
/// the batch path.
#[derive(Debug, Default)]
pub struct RegistryCache {
    inner: Mutex<HashMap<PathBuf, Arc<MostActiveRegistry>>>,
}

impl RegistryCache {
    /// The process-wide cache instance
    pub fn global() -> &'static RegistryCache {
        static GLOBAL: OnceLock<RegistryCache> = OnceLock::new();
        GLOBAL.get_or_init(RegistryCache::default)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<PathBuf, Arc<MostActiveRegistry>>> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Registry for a data root, loading it on first request
    pub fn get_or_load(&self, root: &Path) -> Result<Arc<MostActiveRegistry>> {
        let mut cache = self.lock();
        if let Some(registry) = cache.get(root) {
            return Ok(Arc::clone(registry));
        }
        let registry = Arc::new(MostActiveRegistry::load(
            &root.join(MOST_ACTIVE_FILE_RELPATH),
        )?);
        cache.insert(root.to_path_buf(), Arc::clone(&registry));
        Ok(registry)
    }

    /// Number of cached roots
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop every cached registry (test hook)
    pub fn reset(&self) {
        self.lock().clear();
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

    fn record(product: &str, date: NaiveDate, ticker: &str) -> MostActiveRecord {
        MostActiveRecord::new(product.parse().unwrap(), date, ticker.parse().unwrap())
    }

    #[test]
    fn test_write_read_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("MostActiveTickers.csv");
        let records = vec![
            record("SHFE.rb", d(2021, 10, 11), "SHFE.rb2201"),
            record("DCE.i", d(2021, 10, 11), "DCE.i2201"),
            record("SHFE.rb", d(2021, 10, 12), "SHFE.rb2201"),
        ];
        write_records(&path, &records).unwrap();

        let mut read_back = read_records(&path).unwrap();
        read_back.sort_by(|a, b| (&a.product, a.date).cmp(&(&b.product, b.date)));
        let mut expected = records.clone();
        expected.sort_by(|a, b| (&a.product, a.date).cmp(&(&b.product, b.date)));
        assert_eq!(read_back, expected);
    }

    #[test]
    fn test_registry_lookup() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("MostActiveTickers.csv");
        write_records(&path, &[record("SHFE.rb", d(2021, 10, 11), "SHFE.rb2201")]).unwrap();

        let registry = MostActiveRegistry::load(&path).unwrap();
        let product: Product = "SHFE.rb".parse().unwrap();
        assert_eq!(
            registry.lookup(&product, d(2021, 10, 11)).map(|t| t.name()),
            Some("SHFE.rb2201".to_string())
        );
        assert_eq!(registry.lookup(&product, d(2021, 10, 12)), None);
    }

    #[test]
    fn test_conflicting_duplicate_keys_fatal() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("MostActiveTickers.csv");
        fs::write(
            &path,
            "product,date,ticker\nSHFE.rb,20211011,SHFE.rb2110\nSHFE.rb,20211011,SHFE.rb2201\n",
        )
        .unwrap();
        assert!(matches!(
            MostActiveRegistry::load(&path),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_malformed_row_is_config_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("MostActiveTickers.csv");
        fs::write(&path, "product,date,ticker\nSHFE.rb,2021-10-11,SHFE.rb2110\n").unwrap();
        assert!(matches!(read_records(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_backup_and_replace_preserves_old_content() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("MostActiveTickers.csv");
        write_records(&path, &[record("SHFE.rb", d(2021, 10, 11), "SHFE.rb2110")]).unwrap();
        let old_content = fs::read_to_string(&path).unwrap();

        let backup = backup_and_replace(
            &path,
            &[record("SHFE.rb", d(2021, 10, 11), "SHFE.rb2110"),
              record("SHFE.rb", d(2021, 10, 12), "SHFE.rb2201")],
        )
        .unwrap()
        .expect("live file existed, backup expected");

        assert_eq!(fs::read_to_string(backup).unwrap(), old_content);
        assert_eq!(read_records(&path).unwrap().len(), 2);
    }

    #[test]
    fn test_backup_skipped_for_fresh_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("MostActiveTickers.csv");
        let backup =
            backup_and_replace(&path, &[record("SHFE.rb", d(2021, 10, 11), "SHFE.rb2110")])
                .unwrap();
        assert!(backup.is_none());
        assert!(path.is_file());
    }

    #[test]
    fn test_cache_shares_one_instance_per_root() {
        let tmp = TempDir::new().unwrap();
        let data_dir = tmp.path().join("Data");
        fs::create_dir_all(&data_dir).unwrap();
        write_records(
            &data_dir.join("MostActiveTickers.csv"),
            &[record("SHFE.rb", d(2021, 10, 11), "SHFE.rb2110")],
        )
        .unwrap();

        let cache = RegistryCache::default();
        let a = cache.get_or_load(tmp.path()).unwrap();
        let b = cache.get_or_load(tmp.path()).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);

        cache.reset();
        assert!(cache.is_empty());
    }
}
