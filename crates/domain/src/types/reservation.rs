//! Meeting reservations and booking requests

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::impl_status_conversions;

/// Reservation lifecycle
///
/// Moves only forward: pending to confirmed, and either of those to
/// cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl_status_conversions!(ReservationStatus {
    Pending => "pending",
    Confirmed => "confirmed",
    Cancelled => "cancelled",
});

impl ReservationStatus {
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Confirmed)
                | (Self::Pending, Self::Cancelled)
                | (Self::Confirmed, Self::Cancelled)
        )
    }

    /// Whether the reservation still occupies its time
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Cancelled)
    }
}

/// A stored reservation
///
/// Never hard-deleted; cancellation is a status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingReservation {
    pub id: i64,
    pub lookup_hash: String,
    pub name: String,
    pub email: String,
    pub topic: String,
    pub message: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub duration_minutes: u32,
    pub google_event_id: Option<String>,
    pub google_calendar_status: Option<String>,
    pub meeting_url: Option<String>,
    pub status: ReservationStatus,
    pub confirmation_sent_at: Option<DateTime<Utc>>,
    pub last_notification_sent_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MeetingReservation {
    /// Booked but the visitor was never told
    pub const fn notification_pending(&self) -> bool {
        self.confirmation_sent_at.is_none() && self.status.is_active()
    }
}

/// Reservation before insertion; always stored as pending
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReservation {
    pub lookup_hash: String,
    pub name: String,
    pub email: String,
    pub topic: String,
    pub message: String,
    pub start_at: DateTime<Utc>,
    pub duration_minutes: u32,
    pub google_event_id: Option<String>,
    pub google_calendar_status: Option<String>,
    pub meeting_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewReservation {
    /// `start_at + duration_minutes`
    pub fn end_at(&self) -> DateTime<Utc> {
        self.start_at + Duration::minutes(i64::from(self.duration_minutes))
    }
}

/// Visitor's booking request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub message: String,
    pub start_time: Option<DateTime<Utc>>,
    pub duration_minutes: u32,
}

/// Outcome of a successful booking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingResult {
    pub reservation: MeetingReservation,
    pub calendar_event_id: String,
    /// True when an identical earlier booking was returned instead of a new one
    pub replayed: bool,
}
