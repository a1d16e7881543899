//! Column encoding shared by the SQLite repositories

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rendezvous_domain::{RendezvousError, Result};
use rusqlite::types::Type;

use super::manager::{DbManager, SqliteConnection};

/// Timestamps are stored as unix seconds
pub fn to_ts(at: DateTime<Utc>) -> i64 {
    at.timestamp()
}

pub fn from_ts(idx: usize, secs: i64) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Integer,
            format!("timestamp {secs} out of range").into(),
        )
    })
}

pub fn opt_ts(idx: usize, secs: Option<i64>) -> rusqlite::Result<Option<DateTime<Utc>>> {
    secs.map(|s| from_ts(idx, s)).transpose()
}

/// Parse a status column through its `FromStr` impl
pub fn parse_text<T>(idx: usize, raw: &str) -> rusqlite::Result<T>
where
    T: FromStr<Err = String>,
{
    raw.parse::<T>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into()))
}

/// Run blocking database work on the blocking thread pool
pub async fn with_connection<T, F>(db: &Arc<DbManager>, work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
{
    let db = Arc::clone(db);
    tokio::task::spawn_blocking(move || {
        let mut conn = db.get_connection()?;
        work(&mut conn)
    })
    .await
    .map_err(|e| RendezvousError::Internal(format!("database task failed: {e}")))?
}
