//! Holiday calendar and trading-date generation
//!
//! The holiday file is `EXCHANGE,YYYY/MM/DD` lines, no header, blank lines
//! ignored. It is loaded once per run and treated as read-only afterwards.

use chrono::{Days, NaiveDate};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use crate::constants::{DEFAULT_HOLIDAY_EXCHANGE, HOLIDAY_DATE_FORMAT};
use crate::error::{Error, Result};
use crate::models::SymbolRef;

/// Where the holiday set used for a query came from
///
/// Exchanges absent from the holiday file fall back to the default
/// exchange's set; callers can see that happened instead of silently
/// getting another venue's calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HolidaySource {
    /// The symbol's own exchange had a holiday entry
    Exchange,
    /// Fell back to the default exchange's holiday set
    DefaultFallback,
    /// Holiday exclusion was turned off by the caller
    Disabled,
}

/// Result of a trading-date query
#[derive(Debug, Clone)]
pub struct TradingDates {
    /// Ascending dates in the queried range, holidays removed
    pub dates: Vec<NaiveDate>,
    pub holiday_source: HolidaySource,
}

/// Exchange -> holiday dates, loaded once at startup
#[derive(Debug, Clone)]
pub struct HolidayCalendar {
    holidays: HashMap<String, BTreeSet<NaiveDate>>,
}

impl HolidayCalendar {
    /// Load the holiday file; any malformed line is fatal
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read holiday file {}: {}", path.display(), e))
        })?;
        Self::parse(&content, path)
    }

    fn parse(content: &str, path: &Path) -> Result<Self> {
        let mut holidays: HashMap<String, BTreeSet<NaiveDate>> = HashMap::new();
        for (line_num, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split(',').collect();
            if fields.len() != 2 {
                return Err(Error::Config(format!(
                    "Holiday file {} line {}: expected 2 fields, got {}",
                    path.display(),
                    line_num + 1,
                    fields.len()
                )));
            }
            let date = NaiveDate::parse_from_str(fields[1], HOLIDAY_DATE_FORMAT).map_err(|e| {
                Error::Config(format!(
                    "Holiday file {} line {}: bad date '{}': {}",
                    path.display(),
                    line_num + 1,
                    fields[1],
                    e
                ))
            })?;
            holidays.entry(fields[0].to_string()).or_default().insert(date);
        }
        Ok(Self { holidays })
    }

    /// Exchanges with a holiday entry, sorted
    pub fn exchanges(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.holidays.keys().map(|s| s.as_str()).collect();
        names.sort();
        names
    }

    pub fn holidays_for(&self, exchange: &str) -> Option<&BTreeSet<NaiveDate>> {
        self.holidays.get(exchange)
    }

    /// Enumerate trading dates for a symbol in `[start, end]`
    ///
    /// `end = None` queries the single day `start`. With holidays enabled the
    /// symbol's exchange selects the exclusion set; an exchange without an
    /// entry uses the default exchange's set and the result says so.
    pub fn trading_dates(
        &self,
        symbol: &SymbolRef,
        start: NaiveDate,
        end: Option<NaiveDate>,
        using_holidays: bool,
    ) -> TradingDates {
        static EMPTY: BTreeSet<NaiveDate> = BTreeSet::new();

        let (holidays, holiday_source) = if !using_holidays {
            (&EMPTY, HolidaySource::Disabled)
        } else {
            match self.holidays.get(symbol.exchange()) {
                Some(set) => (set, HolidaySource::Exchange),
                None => (
                    self.holidays
                        .get(DEFAULT_HOLIDAY_EXCHANGE)
                        .unwrap_or(&EMPTY),
                    HolidaySource::DefaultFallback,
                ),
            }
        };

        let mut dates = Vec::new();
        let mut day = start;
        let last = end.unwrap_or(start);
        while day <= last {
            if !holidays.contains(&day) {
                dates.push(day);
            }
            day = match day.checked_add_days(Days::new(1)) {
                Some(next) => next,
                None => break,
            };
        }

        TradingDates {
            dates,
            holiday_source,
        }
    }
}
