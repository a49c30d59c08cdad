//! Reconcile downloaded most-active records into the persisted files
//!
//! One run handles three series: rank 1, rank 2, and the synthesized
//! far-month series. Each goes through read old → conflict check → merge →
//! backup old → atomic replace. A conflict in any series aborts the run
//! before that series' file is touched.

use chrono::{Days, Local, NaiveDate};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::models::MostActiveRecord;
use crate::services::reconciler::{self, LogNotifier};
use crate::services::record_source::{CsvSnapshotSource, RecordSource};
use crate::services::registry;

pub fn run(snapshot: PathBuf, output: PathBuf, output_today: bool, day_offset: i64) {
    println!("🔄 Reconciling most-active records\n");

    match reconcile_all(&snapshot, &output, output_today, day_offset) {
        Ok(()) => {
            println!("\n✅ Reconciliation complete");
        }
        Err(e) => {
            eprintln!("❌ Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn reconcile_all(
    snapshot: &Path,
    output: &Path,
    output_today: bool,
    day_offset: i64,
) -> Result<()> {
    // Offsets always reach backwards: 0 = today, 1 and -1 both = yesterday
    let today = Local::now().date_naive();
    let start = today
        .checked_sub_days(Days::new(day_offset.unsigned_abs()))
        .ok_or_else(|| Error::InvalidInput(format!("Bad day offset: {}", day_offset)))?;

    std::fs::create_dir_all(output)
        .map_err(|e| Error::Io(format!("Failed to create {}: {}", output.display(), e)))?;

    let source = CsvSnapshotSource::new(snapshot);
    let ranked = source.fetch(start)?;
    let rank1 = ranked.get(&1).cloned().unwrap_or_default();
    let rank2 = ranked.get(&2).cloned().unwrap_or_default();
    let longer = reconciler::gen_longer(&rank1, &rank2);

    let series = [
        ("MostActiveTickers_1", rank1),
        ("MostActiveTickers_2", rank2),
        ("MostActiveTickers_2Longer", longer),
    ];

    for (name, new_records) in &series {
        if new_records.is_empty() {
            continue;
        }
        tracing::info!(series = %name, records = new_records.len(), "handling series");
        reconcile_series(name, new_records, output, output_today, today)?;
    }
    Ok(())
}

fn reconcile_series(
    name: &str,
    new_records: &[MostActiveRecord],
    output: &Path,
    output_today: bool,
    today: NaiveDate,
) -> Result<()> {
    let live_path = output.join(format!("{}.csv", name));
    let old_records = if live_path.is_file() {
        registry::read_records(&live_path)?
    } else {
        Vec::new()
    };

    let notifier = LogNotifier;
    let merged = reconciler::reconcile(&old_records, new_records, &notifier)?;

    let backup = registry::backup_and_replace(&live_path, &merged)?;
    match &backup {
        Some(path) => println!(
            "   📄 {} - {} records (backup {})",
            name,
            merged.len(),
            path.display()
        ),
        None => println!("   📄 {} - {} records (new file)", name, merged.len()),
    }

    if output_today {
        let today_records = reconciler::today_subset(&merged, today);
        let today_path = output.join(format!("_{}_Today.csv", name));
        registry::write_records(&today_path, &today_records)?;
        if !today_records.is_empty() {
            let pretty = serde_json::to_string_pretty(&today_records)
                .map_err(|e| Error::Io(format!("Failed to render today subset: {}", e)))?;
            println!("{}", pretty);
        }
    }
    Ok(())
}
