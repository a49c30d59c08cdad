use std::path::PathBuf;

use crate::constants::{DATE_DIR_FORMAT, HOLIDAY_FILE_RELPATH};
use crate::error::Result;
use crate::services::calendar::HolidayCalendar;
use crate::services::registry::RegistryCache;
use crate::services::sessions::{metadata_dir, SessionTable};
use crate::utils::get_data_root;

pub fn run(root: Option<PathBuf>) {
    let root = root.unwrap_or_else(get_data_root);
    println!("📊 Data Root Status: {}\n", root.display());

    match show_status(&root) {
        Ok(()) => {}
        Err(e) => {
            eprintln!("❌ Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn show_status(root: &PathBuf) -> Result<()> {
    let registry = RegistryCache::global().get_or_load(root)?;
    println!("🔹 Most-active registry");
    println!("   Records:  {}", registry.len());
    println!("   Products: {}", registry.products().len());
    if let Some((first, last)) = registry.date_range() {
        println!(
            "   Dates:    {} → {}",
            first.format(DATE_DIR_FORMAT),
            last.format(DATE_DIR_FORMAT)
        );
    }

    let calendar = HolidayCalendar::load(&root.join(HOLIDAY_FILE_RELPATH))?;
    println!("\n🔹 Holiday calendar");
    for exchange in calendar.exchanges() {
        let count = calendar.holidays_for(exchange).map_or(0, |set| set.len());
        println!("   {:<8} {} holidays", exchange, count);
    }

    let sessions = SessionTable::load(&metadata_dir(root)?)?;
    println!("\n🔹 Trading sessions");
    println!("   Definitions: {}", sessions.len());

    Ok(())
}
