//! Port interfaces for scheduling
//!
//! These traits define the boundaries between the scheduling engine and the
//! storage, calendar and mail adapters.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rendezvous_domain::{
    BlacklistEntry, CalendarEventRequest, CreatedEvent, MailMessage, MeetingNotification,
    MeetingReservation, NewNotification, NewReservation, Result, TimeWindow,
};

/// Local source of busy time
#[async_trait]
pub trait AvailabilityStore: Send + Sync {
    /// Busy windows intersecting `[from, to)`
    ///
    /// Must include active reservations and blackout periods, and must leave
    /// out cancelled reservations.
    async fn list_busy_windows(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<TimeWindow>>;
}

/// Blocked visitors
#[async_trait]
pub trait BlacklistStore: Send + Sync {
    /// Look up a normalized (trimmed, lower-case) address
    async fn find_by_email(&self, normalized_email: &str) -> Result<Option<BlacklistEntry>>;
}

/// Reservation persistence
///
/// `create` must refuse a reservation overlapping an active one with
/// `RendezvousError::Conflict`; the in-process conflict check alone cannot
/// rule out two concurrent bookings of the same slot.
#[async_trait]
pub trait ReservationStore: Send + Sync {
    /// Insert a pending reservation
    async fn create(&self, reservation: NewReservation) -> Result<MeetingReservation>;

    /// Most recent reservation with this lookup hash, active ones first
    async fn find_by_lookup_hash(&self, lookup_hash: &str) -> Result<Option<MeetingReservation>>;

    /// Stamp `confirmation_sent_at` and `last_notification_sent_at`
    async fn mark_confirmation_sent(&self, id: i64, at: DateTime<Utc>) -> Result<()>;

    /// Stamp `last_notification_sent_at` only
    async fn mark_notification_sent(&self, id: i64, at: DateTime<Utc>) -> Result<()>;

    /// Pending to confirmed
    async fn confirm(&self, id: i64, at: DateTime<Utc>) -> Result<MeetingReservation>;

    /// Pending or confirmed to cancelled
    async fn cancel(
        &self,
        id: i64,
        reason: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<MeetingReservation>;
}

/// Append-only log of notification attempts
#[async_trait]
pub trait NotificationLog: Send + Sync {
    async fn record(&self, notification: NewNotification) -> Result<MeetingNotification>;

    async fn list_for_reservation(&self, reservation_id: i64) -> Result<Vec<MeetingNotification>>;
}

/// External calendar
///
/// Missing or revoked credentials must surface as
/// `RendezvousError::Unauthorized`, never as a generic failure.
#[async_trait]
pub trait CalendarClient: Send + Sync {
    async fn list_busy_windows(
        &self,
        calendar_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<TimeWindow>>;

    async fn create_event(
        &self,
        calendar_id: &str,
        event: &CalendarEventRequest,
    ) -> Result<CreatedEvent>;
}

/// Outgoing mail
///
/// Same authorization contract as [`CalendarClient`].
#[async_trait]
pub trait MailClient: Send + Sync {
    async fn send(&self, message: &MailMessage) -> Result<()>;
}
