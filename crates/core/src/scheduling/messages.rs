//! Composition of calendar events and notification mails

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use rendezvous_domain::{CalendarEventRequest, MailMessage, MeetingReservation, NotificationConfig};

const LOCAL_FORMAT: &str = "%A, %-d %B %Y %H:%M";

fn local(at: DateTime<Utc>, tz: Tz) -> String {
    at.with_timezone(&tz).format(LOCAL_FORMAT).to_string()
}

fn topic_or_default(topic: &str) -> &str {
    let topic = topic.trim();
    if topic.is_empty() {
        "Meeting"
    } else {
        topic
    }
}

/// Booking details needed to describe the calendar event
#[derive(Debug, Clone, Copy)]
pub struct EventDetails<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub topic: &'a str,
    pub message: &'a str,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub lookup_hash: &'a str,
}

/// Calendar event for a reservation that is about to be stored
pub fn calendar_event(details: &EventDetails<'_>, tz: Tz) -> CalendarEventRequest {
    let EventDetails { name, email, topic, message, start, end, lookup_hash } = *details;

    let mut description = format!("Booked by {name} <{email}>\n");
    if !topic.trim().is_empty() {
        let _ = writeln!(description, "Topic: {}", topic.trim());
    }
    if !message.trim().is_empty() {
        let _ = writeln!(description, "\n{}\n", message.trim());
    }
    let _ = write!(description, "Reference: {lookup_hash}");

    CalendarEventRequest {
        summary: format!("{} with {name}", topic_or_default(topic)),
        description,
        start,
        end,
        attendees: vec![email.to_string()],
        time_zone: tz.name().to_string(),
    }
}

/// Confirmation mail to the visitor, owners in copy
pub fn confirmation_mail(
    reservation: &MeetingReservation,
    config: &NotificationConfig,
    tz: Tz,
) -> MailMessage {
    let topic = topic_or_default(&reservation.topic);
    let mut body = format!("Hello {},\n\nyour meeting is booked.\n\n", reservation.name);
    let _ = writeln!(body, "Topic: {topic}");
    let _ = writeln!(body, "Starts: {} ({})", local(reservation.start_at, tz), tz.name());
    let _ = writeln!(body, "Ends: {} ({})", local(reservation.end_at, tz), tz.name());
    if let Some(url) = &reservation.meeting_url {
        let _ = writeln!(body, "Join: {url}");
    }
    let _ = write!(body, "\nReference: {}\n", reservation.lookup_hash);

    MailMessage {
        from: config.sender.clone(),
        to: vec![reservation.email.clone()],
        cc: config.receivers.clone(),
        subject: format!(
            "{} Confirmed: {topic} on {}",
            config.subject_prefix,
            reservation.start_at.with_timezone(&tz).format("%Y-%m-%d %H:%M")
        ),
        body,
    }
}

/// Cancellation notice to the visitor, owners in copy
pub fn cancellation_mail(
    reservation: &MeetingReservation,
    config: &NotificationConfig,
    tz: Tz,
) -> MailMessage {
    let topic = topic_or_default(&reservation.topic);
    let mut body = format!("Hello {},\n\nyour meeting has been cancelled.\n\n", reservation.name);
    let _ = writeln!(body, "Topic: {topic}");
    let _ = writeln!(body, "Was scheduled: {} ({})", local(reservation.start_at, tz), tz.name());
    if let Some(reason) = reservation.cancellation_reason.as_deref().filter(|r| !r.is_empty()) {
        let _ = writeln!(body, "Reason: {reason}");
    }
    let _ = write!(body, "\nReference: {}\n", reservation.lookup_hash);

    MailMessage {
        from: config.sender.clone(),
        to: vec![reservation.email.clone()],
        cc: config.receivers.clone(),
        subject: format!("{} Cancelled: {topic}", config.subject_prefix),
        body,
    }
}
