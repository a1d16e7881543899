//! Busy intervals

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{RendezvousError, Result};
use crate::impl_status_conversions;

/// Where a busy window came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowSource {
    Reservation,
    Blackout,
    External,
}

impl_status_conversions!(WindowSource {
    Reservation => "reservation",
    Blackout => "blackout",
    External => "external",
});

/// A time interval during which no meeting may be placed
///
/// Constructed per query and never persisted. `end >= start` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    source: WindowSource,
}

impl TimeWindow {
    /// Build a window, rejecting `end < start`
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, source: WindowSource) -> Result<Self> {
        if end < start {
            return Err(RendezvousError::InvalidInput(format!(
                "time window ends ({end}) before it starts ({start})"
            )));
        }
        Ok(Self { start, end, source })
    }

    pub const fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub const fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub const fn source(&self) -> WindowSource {
        self.source
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Widen by `buffer` on both sides
    ///
    /// A negative buffer shrinks the window but never past a zero-length
    /// window at its midpoint.
    #[must_use]
    pub fn expanded(&self, buffer: Duration) -> Self {
        let start = self.start - buffer;
        let end = self.end + buffer;
        if end < start {
            let mid = self.start + self.duration() / 2;
            return Self { start: mid, end: mid, source: self.source };
        }
        Self { start, end, source: self.source }
    }

    /// Half-open overlap with `[start, end)`; touching endpoints do not count
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start < end && self.end > start
    }

    /// Merge step of the window algebra
    ///
    /// Absorbs `other` when it starts no later than this window ends,
    /// extending the end if `other` reaches further.
    pub fn try_absorb(&mut self, other: &Self) -> bool {
        if other.start > self.end {
            return false;
        }
        if other.end > self.end {
            self.end = other.end;
        }
        true
    }
}
