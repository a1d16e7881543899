//! Append-only notification log

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::impl_status_conversions;

/// Which mail was attempted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Confirmation,
    Cancellation,
}

impl_status_conversions!(NotificationKind {
    Confirmation => "confirmation",
    Cancellation => "cancellation",
});

/// Outcome of one attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    Sent,
    Failed,
}

impl_status_conversions!(NotificationStatus {
    Sent => "sent",
    Failed => "failed",
});

/// One logged notification attempt; rows are never updated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingNotification {
    pub id: i64,
    pub reservation_id: i64,
    pub kind: NotificationKind,
    pub status: NotificationStatus,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Notification row before insertion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub reservation_id: i64,
    pub kind: NotificationKind,
    pub status: NotificationStatus,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}
