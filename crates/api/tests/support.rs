//! Shared context for app integration tests
//!
//! Real SQLite storage in a temp dir; the calendar and mail collaborators are
//! in-process doubles so no test touches the network.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use rendezvous_app::{AppContext, Integrations};
use rendezvous_common::MockClock;
use rendezvous_core::scheduling::{CalendarClient, MailClient, SharedClock};
use rendezvous_domain::{
    BookingRequest, CalendarEventRequest, Config, CreatedEvent, DatabaseConfig, MailMessage,
    NotificationConfig, RendezvousError, ResilienceConfig, Result, SchedulingConfig, TimeWindow,
};
use tempfile::TempDir;

/// Monday 2026-03-02 08:00 UTC
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap()
}

/// Tuesday 2026-03-03 at `hour:minute` UTC
pub fn tuesday(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 3, hour, minute, 0).unwrap()
}

#[derive(Default)]
pub struct FakeCalendar {
    busy: Mutex<Vec<TimeWindow>>,
    created: Mutex<Vec<CalendarEventRequest>>,
    unauthorized: Mutex<bool>,
}

impl FakeCalendar {
    pub fn add_busy(&self, window: TimeWindow) {
        self.busy.lock().push(window);
    }

    pub fn revoke(&self) {
        *self.unauthorized.lock() = true;
    }

    pub fn created(&self) -> Vec<CalendarEventRequest> {
        self.created.lock().clone()
    }
}

#[async_trait]
impl CalendarClient for FakeCalendar {
    async fn list_busy_windows(
        &self,
        _calendar_id: &str,
        _from: DateTime<Utc>,
        _to: DateTime<Utc>,
    ) -> Result<Vec<TimeWindow>> {
        if *self.unauthorized.lock() {
            return Err(RendezvousError::Unauthorized("token revoked".into()));
        }
        Ok(self.busy.lock().clone())
    }

    async fn create_event(
        &self,
        _calendar_id: &str,
        event: &CalendarEventRequest,
    ) -> Result<CreatedEvent> {
        if *self.unauthorized.lock() {
            return Err(RendezvousError::Unauthorized("token revoked".into()));
        }
        let mut created = self.created.lock();
        created.push(event.clone());
        let id = format!("evt-{}", created.len());
        Ok(CreatedEvent {
            hangout_link: Some(format!("https://meet.example/{id}")),
            html_link: None,
            status: Some("confirmed".into()),
            id,
        })
    }
}

#[derive(Default)]
pub struct FakeMail {
    sent: Mutex<Vec<MailMessage>>,
    failures_left: AtomicU32,
}

impl FakeMail {
    /// Fail the next `count` sends with a network error
    pub fn fail_next(&self, count: u32) {
        self.failures_left.store(count, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<MailMessage> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl MailClient for FakeMail {
    async fn send(&self, message: &MailMessage) -> Result<()> {
        let remaining = self.failures_left.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures_left.store(remaining - 1, Ordering::SeqCst);
            return Err(RendezvousError::Network("smtp relay unavailable".into()));
        }
        self.sent.lock().push(message.clone());
        Ok(())
    }
}

pub fn test_config(db_path: String) -> Config {
    Config {
        database: DatabaseConfig { path: db_path, pool_size: 4 },
        scheduling: SchedulingConfig {
            timezone: "UTC".into(),
            workday_start_hour: 9,
            workday_end_hour: 18,
            slot_duration_minutes: 30,
            buffer_minutes: 15,
            horizon_days: 7,
            calendar_id: "owner@example.com".into(),
            lookup_salt: "app-test".into(),
        },
        resilience: ResilienceConfig {
            max_retries: 2,
            initial_backoff_ms: 5,
            backoff_multiplier: 2.0,
            max_backoff_ms: 20,
            attempt_timeout_ms: 1_000,
            circuit_failure_threshold: 5,
            circuit_open_seconds: 30,
        },
        notification: NotificationConfig {
            sender: "owner@example.com".into(),
            receivers: vec!["owner@example.com".into()],
            subject_prefix: "[Meeting]".into(),
        },
        ..Config::default()
    }
}

pub fn booking_request(start: DateTime<Utc>) -> BookingRequest {
    BookingRequest {
        name: "Ada Lovelace".into(),
        email: "ada@example.com".into(),
        topic: "Engines".into(),
        message: String::new(),
        start_time: Some(start),
        duration_minutes: 30,
    }
}

pub struct TestContext {
    pub ctx: AppContext,
    pub calendar: Arc<FakeCalendar>,
    pub mail: Arc<FakeMail>,
    pub clock: MockClock,
    _temp_dir: TempDir,
}

/// Fresh context on a new database with the clock pinned to [`now`]
pub fn setup_test_context() -> TestContext {
    let temp_dir = TempDir::new().expect("failed to create temporary database directory");
    let db_path = temp_dir.path().join("rendezvous.db").to_string_lossy().to_string();

    let calendar = Arc::new(FakeCalendar::default());
    let mail = Arc::new(FakeMail::default());
    let clock = MockClock::at(now());
    let integrations = Integrations { calendar: calendar.clone(), mail: mail.clone() };

    let shared: SharedClock = Arc::new(clock.clone());
    let ctx = AppContext::new_with_integrations(test_config(db_path), integrations, shared)
        .expect("context should build");

    TestContext { ctx, calendar, mail, clock, _temp_dir: temp_dir }
}
