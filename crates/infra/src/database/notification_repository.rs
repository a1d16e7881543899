//! SQLite notification log

use std::sync::Arc;

use async_trait::async_trait;
use rendezvous_core::scheduling::NotificationLog;
use rendezvous_domain::{MeetingNotification, NewNotification, Result};
use rusqlite::params;

use super::codec::{from_ts, parse_text, to_ts, with_connection};
use super::manager::{map_sql_error, DbManager};

/// Append-only SQLite implementation of [`NotificationLog`]
pub struct SqliteNotificationLog {
    db: Arc<DbManager>,
}

impl SqliteNotificationLog {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl NotificationLog for SqliteNotificationLog {
    async fn record(&self, notification: NewNotification) -> Result<MeetingNotification> {
        with_connection(&self.db, move |conn| {
            conn.execute(
                "INSERT INTO notifications (reservation_id, kind, status, error_message, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    notification.reservation_id,
                    notification.kind.as_str(),
                    notification.status.as_str(),
                    notification.error_message,
                    to_ts(notification.created_at),
                ],
            )
            .map_err(map_sql_error)?;

            Ok(MeetingNotification {
                id: conn.last_insert_rowid(),
                reservation_id: notification.reservation_id,
                kind: notification.kind,
                status: notification.status,
                error_message: notification.error_message,
                created_at: notification.created_at,
            })
        })
        .await
    }

    async fn list_for_reservation(&self, reservation_id: i64) -> Result<Vec<MeetingNotification>> {
        with_connection(&self.db, move |conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, reservation_id, kind, status, error_message, created_at
                     FROM notifications WHERE reservation_id = ?1 ORDER BY id",
                )
                .map_err(map_sql_error)?;

            let rows = stmt
                .query_map(params![reservation_id], |row| {
                    let kind: String = row.get(2)?;
                    let status: String = row.get(3)?;
                    Ok(MeetingNotification {
                        id: row.get(0)?,
                        reservation_id: row.get(1)?,
                        kind: parse_text(2, &kind)?,
                        status: parse_text(3, &status)?,
                        error_message: row.get(4)?,
                        created_at: from_ts(5, row.get(5)?)?,
                    })
                })
                .map_err(map_sql_error)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(map_sql_error);
            rows
        })
        .await
    }
}
