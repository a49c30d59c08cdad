use chrono::NaiveTime;
use std::sync::OnceLock;

/// Valid trading minutes for one (profile, product) pair on a day
///
/// Windows are inclusive `[start, end]` intervals in non-decreasing time
/// order; intraday breaks show up as gaps between windows. The continuity
/// scan depends on the window ordering, so construction sorts them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradingSession {
    windows: Vec<(NaiveTime, NaiveTime)>,
}

impl TradingSession {
    /// Build a session from `(start, end)` windows, sorting them by start
    pub fn new(mut windows: Vec<(NaiveTime, NaiveTime)>) -> Self {
        windows.sort();
        Self { windows }
    }

    pub fn windows(&self) -> &[(NaiveTime, NaiveTime)] {
        &self.windows
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Number of grid minutes the session expects a bar for
    pub fn expected_minutes(&self) -> usize {
        let grid = minute_grid();
        self.windows
            .iter()
            .map(|&(start, end)| {
                grid.iter().filter(|&&t| t >= start && t <= end).count()
            })
            .sum()
    }
}

static MINUTE_GRID: OnceLock<Vec<NaiveTime>> = OnceLock::new();

/// The canonical comparison grid: every minute of a day, in order
///
/// Session windows are sub-ranges of this grid; the continuity scan walks it
/// with a monotonic index.
pub fn minute_grid() -> &'static [NaiveTime] {
    MINUTE_GRID.get_or_init(|| {
        (0..24 * 60)
            .map(|n| NaiveTime::from_hms_opt(n / 60, n % 60, 0).unwrap())
            .collect()
    })
}
