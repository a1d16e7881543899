//! Interval algebra over busy windows

use chrono::{DateTime, Duration, Utc};
use rendezvous_domain::TimeWindow;

/// Inflate every window by `buffer` on both sides, then merge
///
/// Windows are sorted by start; a window starting at or before the running
/// window's end is absorbed into it. The result is sorted and pairwise
/// disjoint (adjacent windows are fused), so merging it again is a no-op when
/// `buffer` is zero.
pub fn expand_and_merge(windows: &[TimeWindow], buffer: Duration) -> Vec<TimeWindow> {
    let mut expanded: Vec<TimeWindow> = windows.iter().map(|w| w.expanded(buffer)).collect();
    expanded.sort_by_key(TimeWindow::start);

    let mut merged: Vec<TimeWindow> = Vec::with_capacity(expanded.len());
    for window in expanded {
        if merged.last_mut().is_some_and(|current| current.try_absorb(&window)) {
            continue;
        }
        merged.push(window);
    }
    merged
}

/// Whether `[start, end)` intersects any window
///
/// Touching endpoints do not conflict.
pub fn overlaps(start: DateTime<Utc>, end: DateTime<Utc>, windows: &[TimeWindow]) -> bool {
    windows.iter().any(|w| w.overlaps(start, end))
}
