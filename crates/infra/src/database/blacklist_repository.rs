//! SQLite blacklist repository

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rendezvous_common::validation::normalize_email;
use rendezvous_core::scheduling::BlacklistStore;
use rendezvous_domain::{BlacklistEntry, RendezvousError, Result};
use rusqlite::{params, OptionalExtension};
use tracing::instrument;

use super::codec::{from_ts, to_ts, with_connection};
use super::manager::{map_sql_error, DbManager};

/// SQLite implementation of [`BlacklistStore`]
pub struct SqliteBlacklistStore {
    db: Arc<DbManager>,
}

impl SqliteBlacklistStore {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    /// Block an address; re-adding it only replaces the reason
    #[instrument(skip(self, email, reason))]
    pub async fn add_blacklist_entry(
        &self,
        email: &str,
        reason: &str,
        at: DateTime<Utc>,
    ) -> Result<BlacklistEntry> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Err(RendezvousError::InvalidInput("email is required".into()));
        }
        let reason = reason.trim().to_string();

        with_connection(&self.db, move |conn| {
            conn.execute(
                "INSERT INTO blacklist (email, reason, created_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(email) DO UPDATE SET reason = excluded.reason",
                params![email, reason, to_ts(at)],
            )
            .map_err(map_sql_error)?;

            find(conn, &email)?.ok_or_else(|| {
                RendezvousError::Internal("blacklist entry vanished after upsert".into())
            })
        })
        .await
    }
}

fn find(conn: &rusqlite::Connection, email: &str) -> Result<Option<BlacklistEntry>> {
    conn.query_row(
        "SELECT id, email, reason, created_at FROM blacklist WHERE email = ?1",
        params![email],
        |row| {
            Ok(BlacklistEntry {
                id: row.get(0)?,
                email: row.get(1)?,
                reason: row.get(2)?,
                created_at: from_ts(3, row.get(3)?)?,
            })
        },
    )
    .optional()
    .map_err(map_sql_error)
}

#[async_trait]
impl BlacklistStore for SqliteBlacklistStore {
    async fn find_by_email(&self, normalized_email: &str) -> Result<Option<BlacklistEntry>> {
        let email = normalize_email(normalized_email);
        with_connection(&self.db, move |conn| find(conn, &email)).await
    }
}
