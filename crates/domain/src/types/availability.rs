//! Availability calendar returned to visitors

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One candidate meeting slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilitySlot {
    /// RFC 3339 rendering of `start`
    pub id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// False when the slot starts inside the minimum lead time
    pub is_bookable: bool,
}

/// Free slots of one local calendar day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityDay {
    pub date: NaiveDate,
    pub slots: Vec<AvailabilitySlot>,
}

/// Options for an availability query
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityQuery {
    /// First local day to render; today in the configured timezone if unset
    pub start_date: Option<NaiveDate>,
    /// Number of days; the configured horizon if unset, clamped to at least 1
    pub horizon_days: Option<u32>,
}

/// Rendered availability calendar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResponse {
    pub timezone: String,
    pub generated_at: DateTime<Utc>,
    pub days: Vec<AvailabilityDay>,
}

impl AvailabilityResponse {
    /// Every slot across all days, in chronological order
    pub fn slots(&self) -> impl Iterator<Item = &AvailabilitySlot> {
        self.days.iter().flat_map(|day| day.slots.iter())
    }
}
