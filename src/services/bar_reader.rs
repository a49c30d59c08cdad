//! Minute-bar file reading
//!
//! A bar file holds one ticker-day: path `<partition>/<YYYYMMDD>/<TICKER>.csv`,
//! rows `time,open,high,low,close,volume,price,open_interest`. The row
//! format is strict — a wrong field count poisons the whole file. Batch
//! callers treat a poisoned file as warn-and-skip; the file itself never
//! half-parses.

use chrono::{NaiveDate, NaiveTime};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::constants::{BAR_ROW_FIELDS, BAR_TIME_FORMAT, DATE_DIR_FORMAT};
use crate::error::{Error, Result};
use crate::models::{BarRecord, Ticker};
use crate::services::locator::ticker_from_path;

/// Read every bar of one ticker-day file
///
/// Ticker and date are recovered from the path; blank lines are ignored;
/// any row without exactly 8 fields fails the file.
pub fn read_bar_file(path: &Path) -> Result<Vec<BarRecord>> {
    let ticker = ticker_from_path(path).ok_or_else(|| {
        Error::Parse(format!("Bar file name is not a ticker: {}", path.display()))
    })?;
    let date = date_from_path(path)?;

    let file = File::open(path)
        .map_err(|e| Error::Io(format!("Failed to open {}: {}", path.display(), e)))?;
    let reader = BufReader::new(file);

    let mut bars = Vec::new();
    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result
            .map_err(|e| Error::Io(format!("Failed to read line {}: {}", line_num + 1, e)))?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        bars.push(parse_bar_row(line, line_num + 1, &ticker, date, path)?);
    }
    Ok(bars)
}

fn parse_bar_row(
    line: &str,
    line_num: usize,
    ticker: &Ticker,
    date: NaiveDate,
    path: &Path,
) -> Result<BarRecord> {
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() != BAR_ROW_FIELDS {
        return Err(Error::Parse(format!(
            "{} line {}: expected {} fields, got {}",
            path.display(),
            line_num,
            BAR_ROW_FIELDS,
            fields.len()
        )));
    }

    let time = NaiveTime::parse_from_str(fields[0], BAR_TIME_FORMAT).map_err(|e| {
        Error::Parse(format!(
            "{} line {}: bad time '{}': {}",
            path.display(),
            line_num,
            fields[0],
            e
        ))
    })?;

    let mut values = [0f64; 7];
    for (slot, field) in values.iter_mut().zip(&fields[1..]) {
        *slot = field.parse().map_err(|e| {
            Error::Parse(format!(
                "{} line {}: bad number '{}': {}",
                path.display(),
                line_num,
                field,
                e
            ))
        })?;
    }
    let [open, high, low, close, volume, price, open_interest] = values;

    Ok(BarRecord::new(
        ticker.clone(),
        date,
        time,
        open,
        high,
        low,
        close,
        volume,
        price,
        open_interest,
    ))
}

/// Date from the `<YYYYMMDD>` parent directory of a bar file
fn date_from_path(path: &Path) -> Result<NaiveDate> {
    let dir_name = path
        .parent()
        .and_then(|dir| dir.file_name())
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            Error::Parse(format!("Bar file has no date directory: {}", path.display()))
        })?;
    NaiveDate::parse_from_str(dir_name, DATE_DIR_FORMAT).map_err(|e| {
        Error::Parse(format!(
            "Bar file date directory '{}' invalid for {}: {}",
            dir_name,
            path.display(),
            e
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_bar_file(content: &str) -> (TempDir, std::path::PathBuf) {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("20211011");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("SHFE.rb2110.csv");
        fs::write(&path, content).unwrap();
        (tmp, path)
    }

    #[test]
    fn test_reads_well_formed_file() {
        let (_tmp, path) = write_bar_file(
            "09:00:00,4500,4510,4495,4505,1200,4505,180000\n\
             09:01:00,4505,4506,4500,4502,800,4502,180100\n",
        );
        let bars = read_bar_file(&path).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].ticker.name(), "SHFE.rb2110");
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2021, 10, 11).unwrap());
        assert_eq!(bars[0].time, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(bars[0].open, 4500.0);
        assert_eq!(bars[1].open_interest, 180100.0);
    }

    #[test]
    fn test_blank_lines_ignored() {
        let (_tmp, path) = write_bar_file("\n09:00:00,1,2,0.5,1.5,10,1.5,100\n\n");
        assert_eq!(read_bar_file(&path).unwrap().len(), 1);
    }

    #[test]
    fn test_wrong_field_count_is_fatal_for_file() {
        let (_tmp, path) = write_bar_file(
            "09:00:00,1,2,0.5,1.5,10,1.5,100\n\
             09:01:00,1,2,0.5,1.5,10\n",
        );
        assert!(matches!(read_bar_file(&path), Err(Error::Parse(_))));
    }

    #[test]
    fn test_bad_time_is_fatal_for_file() {
        let (_tmp, path) = write_bar_file("9am,1,2,0.5,1.5,10,1.5,100\n");
        assert!(matches!(read_bar_file(&path), Err(Error::Parse(_))));
    }

    #[test]
    fn test_path_without_date_dir_rejected() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("not_a_date");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("SHFE.rb2110.csv");
        fs::write(&path, "").unwrap();
        assert!(matches!(read_bar_file(&path), Err(Error::Parse(_))));
    }
}
