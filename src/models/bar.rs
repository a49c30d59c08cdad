use chrono::{NaiveDate, NaiveTime};

use super::Ticker;

/// One minute bar for one ticker
///
/// Read from the 8-field rows of a `<partition>/<date>/<TICKER>.csv` file.
/// Immutable once read; the ticker and date come from the file path, the
/// remaining fields from the row itself.
#[derive(Debug, Clone, PartialEq)]
pub struct BarRecord {
    pub ticker: Ticker,
    pub date: NaiveDate,
    /// Time of day of the bar, minute resolution
    pub time: NaiveTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    /// Last traded price inside the bar
    pub price: f64,
    pub open_interest: f64,
}

impl BarRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        ticker: Ticker,
        date: NaiveDate,
        time: NaiveTime,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
        price: f64,
        open_interest: f64,
    ) -> Self {
        Self {
            ticker,
            date,
            time,
            open,
            high,
            low,
            close,
            volume,
            price,
            open_interest,
        }
    }
}
