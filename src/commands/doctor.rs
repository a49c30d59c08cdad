//! Minute-bar continuity audit
//!
//! Locates the bar files for a date, reads them, and checks each series
//! against its trading session. Bad files and missing metadata are reported
//! and skipped; only configuration failures stop the audit.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::constants::{
    DATE_DIR_FORMAT, DEFAULT_HOLIDAY_EXCHANGE, DEFAULT_SESSION_PROFILE, HOLIDAY_FILE_RELPATH,
};
use crate::error::{Error, Result};
use crate::models::{SymbolRef, Ticker};
use crate::services::bar_reader::read_bar_file;
use crate::services::calendar::{HolidayCalendar, HolidaySource};
use crate::services::continuity::missing_minutes;
use crate::services::locator::BarFileLocator;
use crate::services::registry::RegistryCache;
use crate::services::sessions::{metadata_dir, SessionTable};
use crate::utils::get_data_root;

pub fn run(root: Option<PathBuf>, date: String, tickers: Option<String>, exchange: Option<String>) {
    let root = root.unwrap_or_else(get_data_root);
    println!("🔍 Checking bar continuity under {}\n", root.display());

    match check(&root, &date, tickers, exchange) {
        Ok(issues) if issues == 0 => {
            println!("\n✅ All checked tickers are complete");
        }
        Ok(issues) => {
            println!("\n⚠️  {} issues found", issues);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("❌ Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn check(
    root: &PathBuf,
    date: &str,
    tickers: Option<String>,
    exchange: Option<String>,
) -> Result<usize> {
    let date = NaiveDate::parse_from_str(date, DATE_DIR_FORMAT)
        .map_err(|e| Error::InvalidInput(format!("Bad date '{}': {}", date, e)))?;

    let sessions = SessionTable::load(&metadata_dir(root)?)?;
    let registry = RegistryCache::global().get_or_load(root)?;
    let calendar = HolidayCalendar::load(&root.join(HOLIDAY_FILE_RELPATH))?;
    let locator = BarFileLocator::new(root);

    // Absent bars on a holiday are not findings
    let checked_exchange = exchange
        .clone()
        .unwrap_or_else(|| DEFAULT_HOLIDAY_EXCHANGE.to_string());
    let open = calendar.trading_dates(
        &SymbolRef::Exchange(checked_exchange.clone()),
        date,
        None,
        true,
    );
    if open.dates.is_empty() {
        println!(
            "ℹ️  {} is a holiday for {}; nothing to check",
            date.format(DATE_DIR_FORMAT),
            checked_exchange
        );
        return Ok(0);
    }
    if open.holiday_source == HolidaySource::DefaultFallback {
        tracing::warn!(
            exchange = %checked_exchange,
            "No holiday entry for exchange, default set used"
        );
    }

    let mut issues = 0;
    let files: BTreeMap<Ticker, PathBuf> = match (&tickers, &exchange) {
        (Some(list), _) => {
            let mut files = BTreeMap::new();
            for name in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                let ticker: Ticker = name.parse()?;
                match locator.file_for_ticker(&ticker, date) {
                    Some(path) => {
                        files.insert(ticker, path);
                    }
                    None => {
                        println!(
                            "   ⚠️  {} - no bar file for {}",
                            name,
                            date.format(DATE_DIR_FORMAT)
                        );
                        issues += 1;
                    }
                }
            }
            files
        }
        (None, Some(exchange)) => locator
            .ticker_files_for_date(date, None)
            .into_iter()
            .filter(|(ticker, _)| ticker.exchange() == exchange.as_str())
            .collect(),
        (None, None) => locator.ticker_files_for_date(date, None),
    };

    if files.is_empty() {
        println!("⚠️  No bar files found for {}", date.format(DATE_DIR_FORMAT));
        return Ok(issues);
    }

    // With an exchange scope, also flag products with no most-active entry
    if exchange.is_some() && tickers.is_none() {
        let mut products: Vec<_> = files.keys().map(|t| t.product.clone()).collect();
        products.sort();
        products.dedup();
        for product in products {
            if registry.lookup(&product, date).is_none() {
                println!(
                    "   ⚠️  {} - no most-active record for {}",
                    product.name(),
                    date.format(DATE_DIR_FORMAT)
                );
                issues += 1;
            }
        }
    }

    println!("📋 Scanning {} tickers...\n", files.len());
    let total = files.len();
    for (n, (ticker, path)) in files.iter().enumerate() {
        print!("   [{:>3}/{}] {} ... ", n + 1, total, ticker.name());
        std::io::Write::flush(&mut std::io::stdout()).ok();

        let bars = match read_bar_file(path) {
            Ok(bars) => bars,
            Err(e) => {
                println!("❌ unreadable");
                tracing::warn!(file = %path.display(), "Skipping bar file: {}", e);
                issues += 1;
                continue;
            }
        };

        let session = match sessions.get(DEFAULT_SESSION_PROFILE, &ticker.product) {
            Some(session) => session,
            None => {
                println!("⚠️  no session definition");
                issues += 1;
                continue;
            }
        };

        let missing = missing_minutes(&bars, session);
        if missing.is_empty() {
            println!("✅");
        } else {
            println!(
                "⚠️  {} of {} expected minutes missing",
                missing.len(),
                session.expected_minutes()
            );
            for time in missing.iter().take(5) {
                println!("        missing {}", time);
            }
            if missing.len() > 5 {
                println!("        ... ({} more)", missing.len() - 5);
            }
            issues += 1;
        }
    }

    Ok(issues)
}
