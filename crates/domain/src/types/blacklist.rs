//! Blocked visitors and blocked time

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A visitor who may not book meetings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlacklistEntry {
    pub id: i64,
    /// Normalized lower-case address, unique
    pub email: String,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

/// A manually configured period with no availability
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blackout {
    pub id: i64,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub reason: Option<String>,
}
