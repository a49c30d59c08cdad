//! Data-tree layout constants
//!
//! Fixed directory and file-format conventions for a bar-data root.
//!
//! ## Directory layout
//!
//! ```text
//! <root>/
//!   BarData/60/<partition>/<YYYYMMDD>/<TICKER>.csv   minute bars
//!   Data/MostActiveTickers.csv                       most-active registry
//!   Release/Data/Holidays.csv                        holiday calendar
//!   Release/Data/TradingSessions.csv                 session table
//! ```
//!
//! `Debug/Data` is accepted in place of `Release/Data` for the
//! session/holiday metadata folder.

/// Asset-class partition directories under the bar-data tree.
///
/// The order is significant: ticker lookups return the first partition that
/// holds a match, and product lookups stop at the first partition that
/// yields any file.
pub const PARTITIONS: &[&str] = &[
    "Futures",
    "Bonds",
    "Commodities",
    "Funds",
    "Indices",
    "Options",
    "Repos",
    "Stocks",
];

/// Minute-bar tree relative to the data root (60-second bars).
pub const BAR_DATA_RELPATH: &str = "BarData/60";

/// Most-active-ticker registry file relative to the data root.
pub const MOST_ACTIVE_FILE_RELPATH: &str = "Data/MostActiveTickers.csv";

/// Holiday calendar file relative to the data root.
pub const HOLIDAY_FILE_RELPATH: &str = "Release/Data/Holidays.csv";

/// Primary location of the session/ticker metadata folder.
pub const RELEASE_DATA_RELPATH: &str = "Release/Data";

/// Fallback location of the session/ticker metadata folder.
pub const DEBUG_DATA_RELPATH: &str = "Debug/Data";

/// Trading-session table file name inside the metadata folder.
pub const SESSION_FILE_NAME: &str = "TradingSessions.csv";

/// Session profile used when a caller does not name one.
pub const DEFAULT_SESSION_PROFILE: &str = "210";

/// Exchange whose holiday set backs exchanges absent from the holiday file.
pub const DEFAULT_HOLIDAY_EXCHANGE: &str = "SHFE";

/// Exact field count of a minute-bar row:
/// `time,open,high,low,close,volume,price,open_interest`.
pub const BAR_ROW_FIELDS: usize = 8;

/// Date-directory and registry date format.
pub const DATE_DIR_FORMAT: &str = "%Y%m%d";

/// Date format inside the holiday file.
pub const HOLIDAY_DATE_FORMAT: &str = "%Y/%m/%d";

/// Time-of-day format of a bar row and the session table.
pub const BAR_TIME_FORMAT: &str = "%H:%M:%S";

/// Timestamp suffix appended to backup copies of the registry file.
pub const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";
