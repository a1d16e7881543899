//! Payloads exchanged with the calendar and mail collaborators

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Event to create on the external calendar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEventRequest {
    pub summary: String,
    pub description: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub attendees: Vec<String>,
    /// IANA timezone the event is displayed in
    pub time_zone: String,
}

/// Event as acknowledged by the external calendar
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedEvent {
    pub id: String,
    pub html_link: Option<String>,
    pub hangout_link: Option<String>,
    pub status: Option<String>,
}

impl CreatedEvent {
    /// Link attendees should open: the video call if any, else the event page
    pub fn meeting_url(&self) -> Option<String> {
        self.hangout_link
            .as_ref()
            .filter(|link| !link.is_empty())
            .or(self.html_link.as_ref().filter(|link| !link.is_empty()))
            .cloned()
    }
}

/// Plain-text mail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailMessage {
    pub from: String,
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub subject: String,
    pub body: String,
}
