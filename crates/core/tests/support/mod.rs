//! Shared test helpers for `rendezvous-core` integration tests.
//!
//! In-memory ports with call counters and failure injection, plus a
//! [`Harness`] that wires them into both services around a pinned clock.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use parking_lot::Mutex;
use rendezvous_common::time::MockClock;
use rendezvous_core::scheduling::{
    AvailabilityService, AvailabilityStore, BlacklistStore, BookingPorts, BookingService,
    CalendarClient, ExternalCallGuard, MailClient, NotificationLog, ReservationStore,
};
use rendezvous_domain::{
    BlacklistEntry, BookingRequest, CalendarEventRequest, CreatedEvent, MailMessage,
    MeetingNotification, MeetingReservation, NewNotification, NewReservation, NotificationConfig,
    RendezvousError, ReservationStatus, ResilienceConfig, Result as DomainResult,
    SchedulingConfig, TimeWindow, WindowSource,
};

/// `2026-03-02 08:00 UTC`, a Monday
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap()
}

/// Helper to build a UTC instant on 2026-03-03
pub fn tuesday(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 3, hour, minute, 0).unwrap()
}

pub fn window(start: DateTime<Utc>, end: DateTime<Utc>, source: WindowSource) -> TimeWindow {
    TimeWindow::new(start, end, source).unwrap()
}

/// In-memory store backing every local port.
#[derive(Default)]
pub struct InMemoryStore {
    reservations: Mutex<Vec<MeetingReservation>>,
    blackouts: Mutex<Vec<TimeWindow>>,
    blacklist: Mutex<Vec<BlacklistEntry>>,
    notifications: Mutex<Vec<MeetingNotification>>,
    busy_error: Mutex<Option<RendezvousError>>,
    pub create_calls: AtomicU32,
}

impl InMemoryStore {
    pub fn with_blackout(self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.blackouts.lock().push(window(start, end, WindowSource::Blackout));
        self
    }

    pub fn with_blacklisted(self, email: &str) -> Self {
        let mut entries = self.blacklist.lock();
        let id = entries.len() as i64 + 1;
        entries.push(BlacklistEntry {
            id,
            email: email.to_string(),
            reason: "spam".into(),
            created_at: now(),
        });
        drop(entries);
        self
    }

    /// Make local busy-window reads fail.
    pub fn fail_busy_windows(&self, error: RendezvousError) {
        *self.busy_error.lock() = Some(error);
    }

    pub fn reservations(&self) -> Vec<MeetingReservation> {
        self.reservations.lock().clone()
    }

    pub fn notifications(&self) -> Vec<MeetingNotification> {
        self.notifications.lock().clone()
    }

    fn update<F>(&self, id: i64, apply: F) -> DomainResult<MeetingReservation>
    where
        F: FnOnce(&mut MeetingReservation) -> DomainResult<()>,
    {
        let mut reservations = self.reservations.lock();
        let reservation = reservations
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| RendezvousError::NotFound(format!("reservation {id}")))?;
        apply(reservation)?;
        Ok(reservation.clone())
    }
}

#[async_trait]
impl AvailabilityStore for InMemoryStore {
    async fn list_busy_windows(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DomainResult<Vec<TimeWindow>> {
        if let Some(error) = self.busy_error.lock().clone() {
            return Err(error);
        }

        let mut windows: Vec<TimeWindow> = self
            .reservations
            .lock()
            .iter()
            .filter(|r| r.status.is_active())
            .map(|r| window(r.start_at, r.end_at, WindowSource::Reservation))
            .collect();
        windows.extend(self.blackouts.lock().iter().cloned());
        windows.retain(|w| w.overlaps(from, to));
        Ok(windows)
    }
}

#[async_trait]
impl BlacklistStore for InMemoryStore {
    async fn find_by_email(&self, normalized_email: &str) -> DomainResult<Option<BlacklistEntry>> {
        Ok(self.blacklist.lock().iter().find(|e| e.email == normalized_email).cloned())
    }
}

#[async_trait]
impl ReservationStore for InMemoryStore {
    async fn create(&self, new: NewReservation) -> DomainResult<MeetingReservation> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let end_at = new.end_at();
        let mut reservations = self.reservations.lock();

        if reservations
            .iter()
            .any(|r| r.status.is_active() && r.start_at < end_at && new.start_at < r.end_at)
        {
            return Err(RendezvousError::Conflict("slot already taken".into()));
        }

        let reservation = MeetingReservation {
            id: reservations.len() as i64 + 1,
            lookup_hash: new.lookup_hash,
            name: new.name,
            email: new.email,
            topic: new.topic,
            message: new.message,
            start_at: new.start_at,
            end_at,
            duration_minutes: new.duration_minutes,
            google_event_id: new.google_event_id,
            google_calendar_status: new.google_calendar_status,
            meeting_url: new.meeting_url,
            status: ReservationStatus::Pending,
            confirmation_sent_at: None,
            last_notification_sent_at: None,
            cancellation_reason: None,
            created_at: new.created_at,
            updated_at: new.created_at,
        };
        reservations.push(reservation.clone());
        Ok(reservation)
    }

    async fn find_by_lookup_hash(
        &self,
        lookup_hash: &str,
    ) -> DomainResult<Option<MeetingReservation>> {
        let reservations = self.reservations.lock();
        let mut matches: Vec<&MeetingReservation> =
            reservations.iter().filter(|r| r.lookup_hash == lookup_hash).collect();
        matches.sort_by_key(|r| (r.status.is_active(), r.id));
        Ok(matches.last().map(|r| (*r).clone()))
    }

    async fn mark_confirmation_sent(&self, id: i64, at: DateTime<Utc>) -> DomainResult<()> {
        self.update(id, |r| {
            r.confirmation_sent_at = Some(at);
            r.last_notification_sent_at = Some(at);
            Ok(())
        })
        .map(|_| ())
    }

    async fn mark_notification_sent(&self, id: i64, at: DateTime<Utc>) -> DomainResult<()> {
        self.update(id, |r| {
            r.last_notification_sent_at = Some(at);
            Ok(())
        })
        .map(|_| ())
    }

    async fn confirm(&self, id: i64, at: DateTime<Utc>) -> DomainResult<MeetingReservation> {
        self.update(id, |r| {
            if r.status != ReservationStatus::Pending {
                return Err(RendezvousError::Conflict("not pending".into()));
            }
            r.status = ReservationStatus::Confirmed;
            r.updated_at = at;
            Ok(())
        })
    }

    async fn cancel(
        &self,
        id: i64,
        reason: Option<String>,
        at: DateTime<Utc>,
    ) -> DomainResult<MeetingReservation> {
        self.update(id, |r| {
            if !r.status.is_active() {
                return Err(RendezvousError::Conflict("already cancelled".into()));
            }
            r.status = ReservationStatus::Cancelled;
            r.cancellation_reason = reason;
            r.updated_at = at;
            Ok(())
        })
    }
}

#[async_trait]
impl NotificationLog for InMemoryStore {
    async fn record(&self, new: NewNotification) -> DomainResult<MeetingNotification> {
        let mut notifications = self.notifications.lock();
        let notification = MeetingNotification {
            id: notifications.len() as i64 + 1,
            reservation_id: new.reservation_id,
            kind: new.kind,
            status: new.status,
            error_message: new.error_message,
            created_at: new.created_at,
        };
        notifications.push(notification.clone());
        Ok(notification)
    }

    async fn list_for_reservation(
        &self,
        reservation_id: i64,
    ) -> DomainResult<Vec<MeetingNotification>> {
        Ok(self
            .notifications
            .lock()
            .iter()
            .filter(|n| n.reservation_id == reservation_id)
            .cloned()
            .collect())
    }
}

/// Calendar double with scripted busy time and failures.
#[derive(Default)]
pub struct ScriptedCalendar {
    busy: Mutex<Vec<TimeWindow>>,
    busy_error: Mutex<Option<RendezvousError>>,
    create_error: Mutex<Option<RendezvousError>>,
    created: Mutex<Vec<CalendarEventRequest>>,
    pub busy_calls: AtomicU32,
    pub create_calls: AtomicU32,
}

impl ScriptedCalendar {
    pub fn with_busy(self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.busy.lock().push(window(start, end, WindowSource::External));
        self
    }

    pub fn fail_busy(&self, error: RendezvousError) {
        *self.busy_error.lock() = Some(error);
    }

    pub fn fail_create(&self, error: RendezvousError) {
        *self.create_error.lock() = Some(error);
    }

    pub fn created(&self) -> Vec<CalendarEventRequest> {
        self.created.lock().clone()
    }

    pub fn busy_calls(&self) -> u32 {
        self.busy_calls.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> u32 {
        self.create_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CalendarClient for ScriptedCalendar {
    async fn list_busy_windows(
        &self,
        _calendar_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DomainResult<Vec<TimeWindow>> {
        self.busy_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.busy_error.lock().clone() {
            return Err(error);
        }
        Ok(self.busy.lock().iter().filter(|w| w.overlaps(from, to)).cloned().collect())
    }

    async fn create_event(
        &self,
        _calendar_id: &str,
        event: &CalendarEventRequest,
    ) -> DomainResult<CreatedEvent> {
        let call = self.create_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(error) = self.create_error.lock().clone() {
            return Err(error);
        }
        self.created.lock().push(event.clone());
        Ok(CreatedEvent {
            id: format!("evt-{call}"),
            html_link: Some(format!("https://calendar.example/evt-{call}")),
            hangout_link: Some(format!("https://meet.example/evt-{call}")),
            status: Some("confirmed".into()),
        })
    }
}

/// Mail double recording every delivered message.
#[derive(Default)]
pub struct RecordingMail {
    error: Mutex<Option<RendezvousError>>,
    sent: Mutex<Vec<MailMessage>>,
    pub calls: AtomicU32,
}

impl RecordingMail {
    pub fn fail_with(&self, error: RendezvousError) {
        *self.error.lock() = Some(error);
    }

    pub fn recover(&self) {
        *self.error.lock() = None;
    }

    pub fn sent(&self) -> Vec<MailMessage> {
        self.sent.lock().clone()
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MailClient for RecordingMail {
    async fn send(&self, message: &MailMessage) -> DomainResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.error.lock().clone() {
            return Err(error);
        }
        self.sent.lock().push(message.clone());
        Ok(())
    }
}

pub fn scheduling_config() -> SchedulingConfig {
    SchedulingConfig {
        timezone: "UTC".into(),
        workday_start_hour: 9,
        workday_end_hour: 18,
        slot_duration_minutes: 30,
        buffer_minutes: 30,
        horizon_days: 14,
        calendar_id: "primary".into(),
        lookup_salt: "test-salt".into(),
    }
}

pub fn resilience_config(max_retries: u32) -> ResilienceConfig {
    ResilienceConfig {
        max_retries,
        initial_backoff_ms: 10,
        backoff_multiplier: 2.0,
        max_backoff_ms: 100,
        attempt_timeout_ms: 1_000,
        circuit_failure_threshold: 5,
        circuit_open_seconds: 30,
    }
}

pub fn notification_config() -> NotificationConfig {
    NotificationConfig {
        sender: "owner@example.org".into(),
        receivers: vec!["assistant@example.org".into()],
        subject_prefix: "[Meeting]".into(),
    }
}

pub fn booking_request(start: DateTime<Utc>) -> BookingRequest {
    BookingRequest {
        name: "Ada Lovelace".into(),
        email: "Ada@Example.com".into(),
        topic: "Analytical engines".into(),
        message: "Looking forward to it".into(),
        start_time: Some(start),
        duration_minutes: 30,
    }
}

/// Both services wired to shared in-memory ports.
pub struct Harness {
    pub store: Arc<InMemoryStore>,
    pub calendar: Arc<ScriptedCalendar>,
    pub mail: Arc<RecordingMail>,
    pub clock: MockClock,
    pub guard: ExternalCallGuard,
    pub booking: BookingService,
    pub availability: AvailabilityService,
}

impl Harness {
    pub fn new(store: InMemoryStore, calendar: ScriptedCalendar) -> Self {
        Self::with_resilience(store, calendar, resilience_config(3))
    }

    pub fn with_resilience(
        store: InMemoryStore,
        calendar: ScriptedCalendar,
        resilience: ResilienceConfig,
    ) -> Self {
        let store = Arc::new(store);
        let calendar = Arc::new(calendar);
        let mail = Arc::new(RecordingMail::default());
        let clock = MockClock::at(now());
        let guard = ExternalCallGuard::new(&resilience, Arc::new(clock.clone())).unwrap();

        let ports = BookingPorts {
            availability: store.clone(),
            blacklist: store.clone(),
            reservations: store.clone(),
            notifications: store.clone(),
            calendar: calendar.clone(),
            mail: mail.clone(),
        };
        let booking = BookingService::new(
            ports,
            guard.clone(),
            scheduling_config(),
            notification_config(),
            Arc::new(clock.clone()),
        )
        .unwrap();
        let availability = AvailabilityService::new(
            store.clone(),
            guard.clone(),
            scheduling_config(),
            Arc::new(clock.clone()),
        )
        .unwrap()
        .with_calendar(calendar.clone());

        Self { store, calendar, mail, clock, guard, booking, availability }
    }

    /// Move the pinned clock forward.
    pub fn advance(&self, by: Duration) {
        self.clock.advance(by.to_std().unwrap());
    }
}
