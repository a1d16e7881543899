//! SQLite reservation repository
//!
//! Also serves local busy time: active reservations plus blackout periods.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rendezvous_core::scheduling::{AvailabilityStore, ReservationStore};
use rendezvous_domain::{
    Blackout, MeetingReservation, NewReservation, RendezvousError, ReservationStatus, Result,
    TimeWindow, WindowSource,
};
use rusqlite::{params, OptionalExtension, Row, TransactionBehavior};
use tracing::{debug, instrument};

use super::codec::{from_ts, opt_ts, parse_text, to_ts, with_connection};
use super::manager::{map_sql_error, DbManager};

const RESERVATION_COLUMNS: &str = "id, lookup_hash, name, email, topic, message, start_at, end_at, \
     duration_minutes, google_event_id, google_calendar_status, meeting_url, status, \
     confirmation_sent_at, last_notification_sent_at, cancellation_reason, created_at, updated_at";

fn map_reservation(row: &Row<'_>) -> rusqlite::Result<MeetingReservation> {
    let status: String = row.get(12)?;
    Ok(MeetingReservation {
        id: row.get(0)?,
        lookup_hash: row.get(1)?,
        name: row.get(2)?,
        email: row.get(3)?,
        topic: row.get(4)?,
        message: row.get(5)?,
        start_at: from_ts(6, row.get(6)?)?,
        end_at: from_ts(7, row.get(7)?)?,
        duration_minutes: row.get(8)?,
        google_event_id: row.get(9)?,
        google_calendar_status: row.get(10)?,
        meeting_url: row.get(11)?,
        status: parse_text(12, &status)?,
        confirmation_sent_at: opt_ts(13, row.get(13)?)?,
        last_notification_sent_at: opt_ts(14, row.get(14)?)?,
        cancellation_reason: row.get(15)?,
        created_at: from_ts(16, row.get(16)?)?,
        updated_at: from_ts(17, row.get(17)?)?,
    })
}

fn load_by_id(conn: &rusqlite::Connection, id: i64) -> Result<MeetingReservation> {
    conn.query_row(
        &format!("SELECT {RESERVATION_COLUMNS} FROM reservations WHERE id = ?1"),
        params![id],
        map_reservation,
    )
    .optional()
    .map_err(map_sql_error)?
    .ok_or_else(|| RendezvousError::NotFound(format!("reservation {id} not found")))
}

/// Apply a status transition the lifecycle allows, otherwise `Conflict`
fn transition(
    conn: &mut rusqlite::Connection,
    id: i64,
    next: ReservationStatus,
    reason: Option<String>,
    at: DateTime<Utc>,
) -> Result<MeetingReservation> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate).map_err(map_sql_error)?;

    let current = load_by_id(&tx, id)?;
    if !current.status.can_transition_to(next) {
        return Err(RendezvousError::Conflict(format!(
            "reservation {id} is {} and cannot become {next}",
            current.status
        )));
    }

    tx.execute(
        "UPDATE reservations
         SET status = ?2, cancellation_reason = COALESCE(?3, cancellation_reason), updated_at = ?4
         WHERE id = ?1",
        params![id, next.as_str(), reason, to_ts(at)],
    )
    .map_err(map_sql_error)?;

    let updated = load_by_id(&tx, id)?;
    tx.commit().map_err(map_sql_error)?;
    Ok(updated)
}

/// SQLite implementation of the reservation and availability ports
pub struct SqliteReservationStore {
    db: Arc<DbManager>,
}

impl SqliteReservationStore {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    /// Block `[start_at, end_at)` for everyone
    #[instrument(skip(self, reason))]
    pub async fn add_blackout(
        &self,
        start_at: DateTime<Utc>,
        end_at: DateTime<Utc>,
        reason: Option<String>,
    ) -> Result<Blackout> {
        if end_at <= start_at {
            return Err(RendezvousError::InvalidInput("blackout must end after it starts".into()));
        }

        with_connection(&self.db, move |conn| {
            conn.execute(
                "INSERT INTO blackouts (start_at, end_at, reason) VALUES (?1, ?2, ?3)",
                params![to_ts(start_at), to_ts(end_at), reason],
            )
            .map_err(map_sql_error)?;

            Ok(Blackout { id: conn.last_insert_rowid(), start_at, end_at, reason })
        })
        .await
    }
}

#[async_trait]
impl AvailabilityStore for SqliteReservationStore {
    #[instrument(skip(self))]
    async fn list_busy_windows(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<TimeWindow>> {
        with_connection(&self.db, move |conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT start_at, end_at, 'reservation' FROM reservations
                     WHERE status != 'cancelled' AND start_at < ?2 AND end_at > ?1
                     UNION ALL
                     SELECT start_at, end_at, 'blackout' FROM blackouts
                     WHERE start_at < ?2 AND end_at > ?1",
                )
                .map_err(map_sql_error)?;

            let rows = stmt
                .query_map(params![to_ts(from), to_ts(to)], |row| {
                    let source: String = row.get(2)?;
                    Ok((
                        from_ts(0, row.get(0)?)?,
                        from_ts(1, row.get(1)?)?,
                        parse_text::<WindowSource>(2, &source)?,
                    ))
                })
                .map_err(map_sql_error)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(map_sql_error)?;

            let windows = rows
                .into_iter()
                .map(|(start, end, source)| TimeWindow::new(start, end, source))
                .collect::<Result<Vec<_>>>()?;
            debug!(count = windows.len(), "local busy windows loaded");
            Ok(windows)
        })
        .await
    }
}

#[async_trait]
impl ReservationStore for SqliteReservationStore {
    #[instrument(skip(self, reservation), fields(start = %reservation.start_at))]
    async fn create(&self, reservation: NewReservation) -> Result<MeetingReservation> {
        with_connection(&self.db, move |conn| {
            let start = to_ts(reservation.start_at);
            let end = to_ts(reservation.end_at());

            // Overlap check and insert must see the same snapshot
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(map_sql_error)?;

            let overlapping: bool = tx
                .query_row(
                    "SELECT EXISTS(SELECT 1 FROM reservations
                     WHERE status != 'cancelled' AND start_at < ?2 AND end_at > ?1)",
                    params![start, end],
                    |row| row.get(0),
                )
                .map_err(map_sql_error)?;
            if overlapping {
                return Err(RendezvousError::Conflict(
                    "the requested time overlaps an existing reservation".into(),
                ));
            }

            let created_at = to_ts(reservation.created_at);
            tx.execute(
                "INSERT INTO reservations (
                    lookup_hash, name, email, topic, message, start_at, end_at, duration_minutes,
                    google_event_id, google_calendar_status, meeting_url, status,
                    created_at, updated_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, 'pending', ?12, ?12)",
                params![
                    reservation.lookup_hash,
                    reservation.name,
                    reservation.email,
                    reservation.topic,
                    reservation.message,
                    start,
                    end,
                    reservation.duration_minutes,
                    reservation.google_event_id,
                    reservation.google_calendar_status,
                    reservation.meeting_url,
                    created_at,
                ],
            )
            .map_err(map_sql_error)?;

            let stored = load_by_id(&tx, tx.last_insert_rowid())?;
            tx.commit().map_err(map_sql_error)?;
            Ok(stored)
        })
        .await
    }

    async fn find_by_lookup_hash(&self, lookup_hash: &str) -> Result<Option<MeetingReservation>> {
        let lookup_hash = lookup_hash.to_string();
        with_connection(&self.db, move |conn| {
            conn.query_row(
                &format!(
                    "SELECT {RESERVATION_COLUMNS} FROM reservations WHERE lookup_hash = ?1
                     ORDER BY (status != 'cancelled') DESC, id DESC LIMIT 1"
                ),
                params![lookup_hash],
                map_reservation,
            )
            .optional()
            .map_err(map_sql_error)
        })
        .await
    }

    async fn mark_confirmation_sent(&self, id: i64, at: DateTime<Utc>) -> Result<()> {
        with_connection(&self.db, move |conn| {
            let changed = conn
                .execute(
                    "UPDATE reservations
                     SET confirmation_sent_at = ?2, last_notification_sent_at = ?2, updated_at = ?2
                     WHERE id = ?1",
                    params![id, to_ts(at)],
                )
                .map_err(map_sql_error)?;
            ensure_changed(id, changed)
        })
        .await
    }

    async fn mark_notification_sent(&self, id: i64, at: DateTime<Utc>) -> Result<()> {
        with_connection(&self.db, move |conn| {
            let changed = conn
                .execute(
                    "UPDATE reservations SET last_notification_sent_at = ?2, updated_at = ?2
                     WHERE id = ?1",
                    params![id, to_ts(at)],
                )
                .map_err(map_sql_error)?;
            ensure_changed(id, changed)
        })
        .await
    }

    #[instrument(skip(self))]
    async fn confirm(&self, id: i64, at: DateTime<Utc>) -> Result<MeetingReservation> {
        with_connection(&self.db, move |conn| {
            transition(conn, id, ReservationStatus::Confirmed, None, at)
        })
        .await
    }

    #[instrument(skip(self, reason))]
    async fn cancel(
        &self,
        id: i64,
        reason: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<MeetingReservation> {
        with_connection(&self.db, move |conn| {
            transition(conn, id, ReservationStatus::Cancelled, reason, at)
        })
        .await
    }
}

fn ensure_changed(id: i64, changed: usize) -> Result<()> {
    if changed == 0 {
        Err(RendezvousError::NotFound(format!("reservation {id} not found")))
    } else {
        Ok(())
    }
}
