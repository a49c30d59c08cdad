//! Session continuity: which expected minutes have no bar
//!
//! The scan is a merge of two sorted sequences: the canonical minute grid
//! restricted to the session windows, and the bar times. Both indices only
//! ever move forward, which requires the windows in non-decreasing order —
//! [`crate::models::TradingSession`] guarantees that.

use chrono::NaiveTime;

use crate::models::{minute_grid, BarRecord, TradingSession};

/// Expected minutes of `session` with no bar in `bars`, in grid order
///
/// Bar times are sorted (stably) before scanning; the input order does not
/// matter. An empty bar series reports every expected minute; a session with
/// no windows reports nothing. Each call scans from scratch — no state
/// survives between calls.
pub fn missing_minutes(bars: &[BarRecord], session: &TradingSession) -> Vec<NaiveTime> {
    let mut bar_times: Vec<NaiveTime> = bars.iter().map(|bar| bar.time).collect();
    bar_times.sort();

    let grid = minute_grid();
    let mut missing = Vec::new();
    // Both cursors persist across windows and never rewind.
    let mut grid_idx = 0;
    let mut bar_idx = 0;

    for &(start, end) in session.windows() {
        while grid_idx < grid.len() && grid[grid_idx] < start {
            grid_idx += 1;
        }
        while grid_idx < grid.len() && grid[grid_idx] <= end {
            let expected = grid[grid_idx];
            while bar_idx < bar_times.len() && bar_times[bar_idx] < expected {
                bar_idx += 1;
            }
            if bar_idx >= bar_times.len() || bar_times[bar_idx] != expected {
                missing.push(expected);
            }
            grid_idx += 1;
        }
    }
    missing
}
