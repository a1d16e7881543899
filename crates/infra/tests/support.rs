//! Shared fixtures for infra integration tests

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use rendezvous_domain::NewReservation;
use rendezvous_infra::database::DbManager;
use tempfile::TempDir;

/// Temporary migrated database; the directory lives as long as the value
pub struct TestDatabase {
    pub manager: Arc<DbManager>,
    _temp_dir: TempDir,
}

impl TestDatabase {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir should be created");
        let manager =
            DbManager::new(temp_dir.path().join("rendezvous.db"), 4).expect("db manager created");
        manager.run_migrations().expect("migrations should run");

        Self { manager: Arc::new(manager), _temp_dir: temp_dir }
    }
}

impl Default for TestDatabase {
    fn default() -> Self {
        Self::new()
    }
}

/// 2026-03-03 (a Tuesday) at `hour:minute` UTC
pub fn tuesday(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 3, hour, minute, 0).unwrap()
}

pub fn new_reservation(lookup_hash: &str, start: DateTime<Utc>, minutes: u32) -> NewReservation {
    NewReservation {
        lookup_hash: lookup_hash.to_string(),
        name: "Ada Lovelace".into(),
        email: "ada@example.com".into(),
        topic: "Analytical engine".into(),
        message: String::new(),
        start_at: start,
        duration_minutes: minutes,
        google_event_id: Some(format!("evt-{lookup_hash}")),
        google_calendar_status: Some("confirmed".into()),
        meeting_url: Some("https://meet.example/abc".into()),
        created_at: tuesday(8, 0),
    }
}
