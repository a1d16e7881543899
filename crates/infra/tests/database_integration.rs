//! SQLite repository behavior against a real on-disk database

mod support;

use chrono::Duration;
use rendezvous_core::scheduling::{
    AvailabilityStore, BlacklistStore, NotificationLog, ReservationStore,
};
use rendezvous_domain::{
    NewNotification, NotificationKind, NotificationStatus, RendezvousError, ReservationStatus,
    WindowSource,
};
use rendezvous_infra::database::{
    SqliteBlacklistStore, SqliteNotificationLog, SqliteReservationStore,
};
use support::{new_reservation, tuesday, TestDatabase};

#[tokio::test]
async fn test_create_rejects_overlapping_active_reservation() {
    let db = TestDatabase::new();
    let store = SqliteReservationStore::new(db.manager.clone());

    let first = store.create(new_reservation("h1", tuesday(10, 0), 30)).await.unwrap();
    assert_eq!(first.status, ReservationStatus::Pending);
    assert_eq!(first.end_at, tuesday(10, 30));
    assert_eq!(first.created_at, first.updated_at);

    let err = store.create(new_reservation("h2", tuesday(10, 15), 30)).await.unwrap_err();
    assert!(matches!(err, RendezvousError::Conflict(_)));

    // touching intervals do not overlap
    store.create(new_reservation("h3", tuesday(10, 30), 30)).await.unwrap();
}

#[tokio::test]
async fn test_duplicate_active_lookup_hash_is_a_conflict() {
    let db = TestDatabase::new();
    let store = SqliteReservationStore::new(db.manager.clone());

    store.create(new_reservation("same", tuesday(10, 0), 30)).await.unwrap();
    let err = store.create(new_reservation("same", tuesday(14, 0), 30)).await.unwrap_err();

    assert!(matches!(err, RendezvousError::Conflict(_)));
}

#[tokio::test]
async fn test_cancelled_reservations_free_their_time_and_hash() {
    let db = TestDatabase::new();
    let store = SqliteReservationStore::new(db.manager.clone());

    let created = store.create(new_reservation("h1", tuesday(10, 0), 30)).await.unwrap();
    let cancelled = store
        .cancel(created.id, Some("plans changed".into()), tuesday(9, 0))
        .await
        .unwrap();
    assert_eq!(cancelled.status, ReservationStatus::Cancelled);
    assert_eq!(cancelled.cancellation_reason.as_deref(), Some("plans changed"));
    assert_eq!(cancelled.updated_at, tuesday(9, 0));

    let busy = store.list_busy_windows(tuesday(0, 0), tuesday(23, 0)).await.unwrap();
    assert!(busy.is_empty());

    let rebooked = store.create(new_reservation("h1", tuesday(10, 0), 30)).await.unwrap();
    let found = store.find_by_lookup_hash("h1").await.unwrap().unwrap();
    assert_eq!(found.id, rebooked.id);
    assert_eq!(found.status, ReservationStatus::Pending);
}

#[tokio::test]
async fn test_find_by_lookup_hash_returns_none_when_missing() {
    let db = TestDatabase::new();
    let store = SqliteReservationStore::new(db.manager.clone());

    assert!(store.find_by_lookup_hash("nope").await.unwrap().is_none());
}

#[tokio::test]
async fn test_busy_windows_merge_reservations_and_blackouts_in_range() {
    let db = TestDatabase::new();
    let store = SqliteReservationStore::new(db.manager.clone());

    store.create(new_reservation("h1", tuesday(10, 0), 60)).await.unwrap();
    store.create(new_reservation("h2", tuesday(20, 0), 30)).await.unwrap();
    let blackout =
        store.add_blackout(tuesday(12, 0), tuesday(13, 0), Some("lunch".into())).await.unwrap();
    assert!(blackout.id > 0);

    let mut busy = store.list_busy_windows(tuesday(9, 0), tuesday(18, 0)).await.unwrap();
    busy.sort_by_key(|w| w.start());

    assert_eq!(busy.len(), 2);
    assert_eq!(busy[0].start(), tuesday(10, 0));
    assert_eq!(busy[0].source(), WindowSource::Reservation);
    assert_eq!(busy[1].end(), tuesday(13, 0));
    assert_eq!(busy[1].source(), WindowSource::Blackout);
}

#[tokio::test]
async fn test_blackout_must_end_after_start() {
    let db = TestDatabase::new();
    let store = SqliteReservationStore::new(db.manager.clone());

    let err = store.add_blackout(tuesday(12, 0), tuesday(12, 0), None).await.unwrap_err();
    assert!(matches!(err, RendezvousError::InvalidInput(_)));
}

#[tokio::test]
async fn test_lifecycle_only_moves_forward() {
    let db = TestDatabase::new();
    let store = SqliteReservationStore::new(db.manager.clone());
    let created = store.create(new_reservation("h1", tuesday(10, 0), 30)).await.unwrap();

    let confirmed = store.confirm(created.id, tuesday(8, 30)).await.unwrap();
    assert_eq!(confirmed.status, ReservationStatus::Confirmed);

    let err = store.confirm(created.id, tuesday(8, 31)).await.unwrap_err();
    assert!(matches!(err, RendezvousError::Conflict(_)));

    store.cancel(created.id, None, tuesday(8, 32)).await.unwrap();
    let err = store.cancel(created.id, None, tuesday(8, 33)).await.unwrap_err();
    assert!(matches!(err, RendezvousError::Conflict(_)));

    let err = store.confirm(9_999, tuesday(8, 34)).await.unwrap_err();
    assert!(matches!(err, RendezvousError::NotFound(_)));
}

#[tokio::test]
async fn test_notification_timestamps_are_recorded() {
    let db = TestDatabase::new();
    let store = SqliteReservationStore::new(db.manager.clone());
    let created = store.create(new_reservation("h1", tuesday(10, 0), 30)).await.unwrap();
    assert!(created.confirmation_sent_at.is_none());

    store.mark_confirmation_sent(created.id, tuesday(8, 1)).await.unwrap();
    store.mark_notification_sent(created.id, tuesday(8, 5)).await.unwrap();

    let found = store.find_by_lookup_hash("h1").await.unwrap().unwrap();
    assert_eq!(found.confirmation_sent_at, Some(tuesday(8, 1)));
    assert_eq!(found.last_notification_sent_at, Some(tuesday(8, 5)));

    let err = store.mark_confirmation_sent(4_242, tuesday(8, 1)).await.unwrap_err();
    assert!(matches!(err, RendezvousError::NotFound(_)));
}

#[tokio::test]
async fn test_blacklist_upsert_normalizes_and_replaces_reason() {
    let db = TestDatabase::new();
    let blacklist = SqliteBlacklistStore::new(db.manager.clone());

    let first =
        blacklist.add_blacklist_entry("  Spam@Example.COM ", "spam", tuesday(8, 0)).await.unwrap();
    assert_eq!(first.email, "spam@example.com");

    let second = blacklist
        .add_blacklist_entry("spam@example.com", "repeat offender", tuesday(9, 0))
        .await
        .unwrap();
    assert_eq!(second.id, first.id);
    assert_eq!(second.reason, "repeat offender");
    assert_eq!(second.created_at, tuesday(8, 0));

    let found = blacklist.find_by_email("SPAM@example.com").await.unwrap();
    assert_eq!(found.map(|e| e.id), Some(first.id));
    assert!(blacklist.find_by_email("ok@example.com").await.unwrap().is_none());

    let err = blacklist.add_blacklist_entry("   ", "", tuesday(8, 0)).await.unwrap_err();
    assert!(matches!(err, RendezvousError::InvalidInput(_)));
}

#[tokio::test]
async fn test_notification_log_lists_attempts_in_order() {
    let db = TestDatabase::new();
    let store = SqliteReservationStore::new(db.manager.clone());
    let log = SqliteNotificationLog::new(db.manager.clone());
    let created = store.create(new_reservation("h1", tuesday(10, 0), 30)).await.unwrap();

    log.record(NewNotification {
        reservation_id: created.id,
        kind: NotificationKind::Confirmation,
        status: NotificationStatus::Failed,
        error_message: Some("HTTP 503".into()),
        created_at: tuesday(8, 0),
    })
    .await
    .unwrap();
    log.record(NewNotification {
        reservation_id: created.id,
        kind: NotificationKind::Confirmation,
        status: NotificationStatus::Sent,
        error_message: None,
        created_at: tuesday(8, 0) + Duration::minutes(1),
    })
    .await
    .unwrap();

    let entries = log.list_for_reservation(created.id).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].status, NotificationStatus::Failed);
    assert_eq!(entries[0].error_message.as_deref(), Some("HTTP 503"));
    assert_eq!(entries[1].status, NotificationStatus::Sent);
    assert!(log.list_for_reservation(created.id + 1).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_data_survives_reopening_the_database() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let path = temp_dir.path().join("persist.db");

    {
        let manager = rendezvous_infra::DbManager::new(&path, 1).unwrap();
        manager.run_migrations().unwrap();
        let store = SqliteReservationStore::new(std::sync::Arc::new(manager));
        store.create(new_reservation("keep", tuesday(10, 0), 45)).await.unwrap();
    }

    let manager = rendezvous_infra::DbManager::new(&path, 1).unwrap();
    manager.run_migrations().unwrap();
    let store = SqliteReservationStore::new(std::sync::Arc::new(manager));
    let found = store.find_by_lookup_hash("keep").await.unwrap().unwrap();
    assert_eq!(found.duration_minutes, 45);
    assert_eq!(found.meeting_url.as_deref(), Some("https://meet.example/abc"));
}
