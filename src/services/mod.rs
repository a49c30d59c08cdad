pub mod bar_reader;
pub mod calendar;
pub mod continuity;
pub mod locator;
pub mod reconciler;
pub mod record_source;
pub mod registry;
pub mod sessions;

pub use bar_reader::read_bar_file;
pub use calendar::{HolidayCalendar, HolidaySource, TradingDates};
pub use continuity::missing_minutes;
pub use locator::BarFileLocator;
pub use reconciler::{ConflictNotifier, LogNotifier, RecordConflict};
pub use record_source::{CsvSnapshotSource, RankedRecords, RecordSource};
pub use registry::{MostActiveRegistry, RegistryCache};
pub use sessions::SessionTable;
