//! Booking orchestrator
//!
//! A booking runs strictly in this order:
//!
//! 1. validate the request
//! 2. reject starts inside the minimum lead time
//! 3. reject blacklisted visitors
//! 4. replay an identical earlier booking instead of creating a new one
//! 5. check local and external busy time
//! 6. create the calendar event
//! 7. persist the reservation as pending
//! 8. send the confirmation mail
//!
//! Steps 1 to 4 never touch an external system. A mail failure after step 7
//! is returned to the caller but the reservation stays; retrying the same
//! request replays it and re-sends the mail.

use std::sync::Arc;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use chrono_tz::Tz;
use rendezvous_common::validation::{
    normalize_email, EmailValidator, RangeValidator, StringValidator, ValidationError,
};
use rendezvous_domain::constants::{
    MAX_MEETING_DURATION_MINUTES, MAX_MESSAGE_LENGTH, MAX_NAME_LENGTH, MAX_TOPIC_LENGTH,
    MIN_LEAD_TIME_MINUTES,
};
use rendezvous_domain::{
    BookingRequest, BookingResult, MeetingReservation, NewNotification, NewReservation,
    NotificationConfig, NotificationKind, NotificationStatus, RendezvousError, ReservationStatus,
    Result, SchedulingConfig,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use super::guard::{ExternalCallGuard, SharedClock};
use super::lookup::lookup_hash;
use super::messages::{self, EventDetails};
use super::ports::{
    AvailabilityStore, BlacklistStore, CalendarClient, MailClient, NotificationLog,
    ReservationStore,
};
use super::windows::{expand_and_merge, overlaps};

/// Collaborators the orchestrator drives
#[derive(Clone)]
pub struct BookingPorts {
    pub availability: Arc<dyn AvailabilityStore>,
    pub blacklist: Arc<dyn BlacklistStore>,
    pub reservations: Arc<dyn ReservationStore>,
    pub notifications: Arc<dyn NotificationLog>,
    pub calendar: Arc<dyn CalendarClient>,
    pub mail: Arc<dyn MailClient>,
}

/// A request that passed validation
#[derive(Debug, Clone)]
struct ValidatedBooking {
    name: String,
    email: String,
    topic: String,
    message: String,
    start: DateTime<Utc>,
    duration_minutes: u32,
}

impl ValidatedBooking {
    fn end(&self) -> DateTime<Utc> {
        self.start + Duration::minutes(i64::from(self.duration_minutes))
    }
}

fn validate(request: &BookingRequest) -> Result<ValidatedBooking> {
    let mut errors = ValidationError::new();

    errors.check(
        "name",
        &StringValidator::new().not_empty().max_length(MAX_NAME_LENGTH),
        request.name.as_str(),
    );
    if request.email.trim().is_empty() {
        errors.add_field_error("email", "Value cannot be empty");
    } else {
        errors.check("email", &EmailValidator::new(), request.email.as_str());
    }
    errors.check(
        "topic",
        &StringValidator::new().max_length(MAX_TOPIC_LENGTH),
        request.topic.as_str(),
    );
    errors.check(
        "message",
        &StringValidator::new().max_length(MAX_MESSAGE_LENGTH),
        request.message.as_str(),
    );
    errors.check(
        "durationMinutes",
        &RangeValidator::empty().greater_than(0).max(MAX_MEETING_DURATION_MINUTES),
        &request.duration_minutes,
    );
    if request.start_time.is_none() {
        errors.add_field_error("startTime", "Start time is required");
    }

    errors.into_result().map_err(|e| RendezvousError::InvalidInput(e.to_string()))?;

    let start = request
        .start_time
        .ok_or_else(|| RendezvousError::InvalidInput("startTime: Start time is required".into()))?;

    Ok(ValidatedBooking {
        name: request.name.trim().to_string(),
        email: normalize_email(&request.email),
        topic: request.topic.trim().to_string(),
        message: request.message.trim().to_string(),
        start: start.trunc_subsecs(0),
        duration_minutes: request.duration_minutes,
    })
}

/// Booking orchestration service
pub struct BookingService {
    ports: BookingPorts,
    guard: ExternalCallGuard,
    scheduling: SchedulingConfig,
    notification: NotificationConfig,
    tz: Tz,
    clock: SharedClock,
}

impl BookingService {
    /// Create a new booking service
    pub fn new(
        ports: BookingPorts,
        guard: ExternalCallGuard,
        scheduling: SchedulingConfig,
        notification: NotificationConfig,
        clock: SharedClock,
    ) -> Result<Self> {
        scheduling.validate()?;
        let tz = scheduling.tz()?;
        Ok(Self { ports, guard, scheduling, notification, tz, clock })
    }

    /// Retry executor and breakers used for external calls
    pub fn guard(&self) -> &ExternalCallGuard {
        &self.guard
    }

    /// Book a meeting
    #[instrument(
        skip(self, token, request),
        fields(start = ?request.start_time, duration = request.duration_minutes)
    )]
    pub async fn book(
        &self,
        token: &CancellationToken,
        request: BookingRequest,
    ) -> Result<BookingResult> {
        let booking = validate(&request)?;

        let now = self.clock.utc_now();
        if booking.start < now + Duration::minutes(MIN_LEAD_TIME_MINUTES) {
            return Err(RendezvousError::InvalidInput(format!(
                "meetings must start at least {MIN_LEAD_TIME_MINUTES} minutes from now"
            )));
        }

        self.ensure_not_blacklisted(&booking.email).await?;

        let hash =
            lookup_hash(&self.scheduling.lookup_salt, &booking.email, &booking.name, booking.start);
        if let Some(existing) = self.find_active(&hash).await? {
            ensure_same_booking(&existing, &booking)?;
            return self.replay(token, existing).await;
        }

        let end = booking.end();
        self.ensure_slot_free(token, booking.start, end).await?;

        let event_request = messages::calendar_event(
            &EventDetails {
                name: &booking.name,
                email: &booking.email,
                topic: &booking.topic,
                message: &booking.message,
                start: booking.start,
                end,
                lookup_hash: &hash,
            },
            self.tz,
        );
        let calendar_id = self.scheduling.calendar_id.as_str();
        let event = self
            .guard
            .calendar(token, "create calendar event", || {
                self.ports.calendar.create_event(calendar_id, &event_request)
            })
            .await?;
        debug!(event_id = %event.id, "calendar event created");

        let meeting_url = event.meeting_url();
        let new_reservation = NewReservation {
            lookup_hash: hash,
            name: booking.name,
            email: booking.email,
            topic: booking.topic,
            message: booking.message,
            start_at: booking.start,
            duration_minutes: booking.duration_minutes,
            google_event_id: Some(event.id.clone()),
            google_calendar_status: event.status.clone(),
            meeting_url,
            created_at: self.clock.utc_now(),
        };

        let reservation = self.ports.reservations.create(new_reservation).await.map_err(|err| {
            error!(
                event_id = %event.id,
                error = %err,
                "calendar event created but reservation not stored"
            );
            match err {
                RendezvousError::Conflict(message) => RendezvousError::Conflict(message),
                other => RendezvousError::Internal(format!("failed to store reservation: {other}")),
            }
        })?;
        info!(
            reservation_id = reservation.id,
            lookup_hash = %reservation.lookup_hash,
            "reservation created"
        );

        let reservation = self.send_confirmation(token, reservation).await?;

        Ok(BookingResult { reservation, calendar_event_id: event.id, replayed: false })
    }

    /// Find a reservation by its lookup hash
    pub async fn lookup(&self, lookup_hash: &str) -> Result<MeetingReservation> {
        let lookup_hash = lookup_hash.trim();
        if lookup_hash.is_empty() {
            return Err(RendezvousError::InvalidInput("lookup hash is required".into()));
        }

        self.ports
            .reservations
            .find_by_lookup_hash(lookup_hash)
            .await?
            .ok_or_else(|| RendezvousError::NotFound(format!("no reservation for {lookup_hash}")))
    }

    /// Confirm a pending reservation
    #[instrument(skip(self))]
    pub async fn confirm(&self, lookup_hash: &str) -> Result<MeetingReservation> {
        let reservation = self.lookup(lookup_hash).await?;
        ensure_transition(&reservation, ReservationStatus::Confirmed)?;

        let updated = self.ports.reservations.confirm(reservation.id, self.clock.utc_now()).await?;
        info!(reservation_id = updated.id, "reservation confirmed");
        Ok(updated)
    }

    /// Cancel a pending or confirmed reservation
    ///
    /// The visitor is notified on a best-effort basis; a failed mail is
    /// logged but does not undo the cancellation.
    #[instrument(skip(self, token, reason))]
    pub async fn cancel(
        &self,
        token: &CancellationToken,
        lookup_hash: &str,
        reason: Option<String>,
    ) -> Result<MeetingReservation> {
        let reservation = self.lookup(lookup_hash).await?;
        ensure_transition(&reservation, ReservationStatus::Cancelled)?;

        let reason = reason.map(|r| r.trim().to_string()).filter(|r| !r.is_empty());
        let mut updated =
            self.ports.reservations.cancel(reservation.id, reason, self.clock.utc_now()).await?;
        info!(reservation_id = updated.id, "reservation cancelled");

        let message = messages::cancellation_mail(&updated, &self.notification, self.tz);
        let outcome = self
            .guard
            .mail(token, "send cancellation mail", || self.ports.mail.send(&message))
            .await;
        let now = self.clock.utc_now();
        self.log_notification(updated.id, NotificationKind::Cancellation, &outcome, now).await;

        match outcome {
            Ok(()) => {
                if let Err(err) =
                    self.ports.reservations.mark_notification_sent(updated.id, now).await
                {
                    warn!(
                        reservation_id = updated.id,
                        error = %err,
                        "failed to stamp notification time"
                    );
                } else {
                    updated.last_notification_sent_at = Some(now);
                }
            }
            Err(err) => {
                warn!(reservation_id = updated.id, error = %err, "cancellation mail not delivered");
            }
        }

        Ok(updated)
    }

    async fn ensure_not_blacklisted(&self, email: &str) -> Result<()> {
        match self.ports.blacklist.find_by_email(email).await {
            Ok(Some(entry)) => {
                info!(entry_id = entry.id, "booking rejected for blacklisted address");
                Err(RendezvousError::Forbidden("this address may not book meetings".into()))
            }
            Ok(None) | Err(RendezvousError::NotFound(_)) => Ok(()),
            Err(err) => Err(RendezvousError::Internal(format!("blacklist lookup failed: {err}"))),
        }
    }

    async fn find_active(&self, hash: &str) -> Result<Option<MeetingReservation>> {
        match self.ports.reservations.find_by_lookup_hash(hash).await {
            Ok(found) => Ok(found.filter(|r| r.status.is_active())),
            Err(RendezvousError::NotFound(_)) => Ok(None),
            Err(err) => Err(RendezvousError::Internal(format!("reservation lookup failed: {err}"))),
        }
    }

    async fn replay(
        &self,
        token: &CancellationToken,
        existing: MeetingReservation,
    ) -> Result<BookingResult> {
        info!(reservation_id = existing.id, "replaying existing reservation");
        let calendar_event_id = existing.google_event_id.clone().unwrap_or_default();

        let reservation = if existing.notification_pending() {
            self.send_confirmation(token, existing).await?
        } else {
            existing
        };

        Ok(BookingResult { reservation, calendar_event_id, replayed: true })
    }

    async fn ensure_slot_free(
        &self,
        token: &CancellationToken,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<()> {
        let buffer = self.scheduling.buffer();
        let (from, to) = (start - buffer, end + buffer);

        let mut windows = self
            .ports
            .availability
            .list_busy_windows(from, to)
            .await
            .map_err(|e| RendezvousError::Internal(format!("failed to load busy windows: {e}")))?;

        let calendar_id = self.scheduling.calendar_id.as_str();
        let external = self
            .guard
            .calendar(token, "list calendar busy windows", || {
                self.ports.calendar.list_busy_windows(calendar_id, from, to)
            })
            .await?;
        windows.extend(external);

        let merged = expand_and_merge(&windows, buffer);
        if overlaps(start, end, &merged) {
            return Err(RendezvousError::Conflict(
                "the requested time is no longer available".into(),
            ));
        }
        Ok(())
    }

    async fn send_confirmation(
        &self,
        token: &CancellationToken,
        mut reservation: MeetingReservation,
    ) -> Result<MeetingReservation> {
        let message = messages::confirmation_mail(&reservation, &self.notification, self.tz);
        let outcome = self
            .guard
            .mail(token, "send confirmation mail", || self.ports.mail.send(&message))
            .await;
        let now = self.clock.utc_now();
        self.log_notification(reservation.id, NotificationKind::Confirmation, &outcome, now).await;

        match outcome {
            Ok(()) => {
                if let Err(err) =
                    self.ports.reservations.mark_confirmation_sent(reservation.id, now).await
                {
                    warn!(
                        reservation_id = reservation.id,
                        error = %err,
                        "failed to stamp confirmation time"
                    );
                } else {
                    reservation.confirmation_sent_at = Some(now);
                    reservation.last_notification_sent_at = Some(now);
                }
                Ok(reservation)
            }
            Err(err) => {
                error!(
                    reservation_id = reservation.id,
                    error = %err,
                    "confirmation mail failed, reservation kept with notification pending"
                );
                Err(err)
            }
        }
    }

    async fn log_notification(
        &self,
        reservation_id: i64,
        kind: NotificationKind,
        outcome: &Result<()>,
        at: DateTime<Utc>,
    ) {
        let (status, error_message) = match outcome {
            Ok(()) => (NotificationStatus::Sent, None),
            Err(err) => (NotificationStatus::Failed, Some(err.to_string())),
        };

        let entry = NewNotification { reservation_id, kind, status, error_message, created_at: at };
        if let Err(err) = self.ports.notifications.record(entry).await {
            warn!(reservation_id, %kind, error = %err, "failed to record notification attempt");
        }
    }
}

/// A replay must describe the meeting already booked under the same hash
fn ensure_same_booking(existing: &MeetingReservation, booking: &ValidatedBooking) -> Result<()> {
    if existing.duration_minutes != booking.duration_minutes || existing.topic != booking.topic {
        return Err(RendezvousError::Conflict(format!(
            "a different meeting is already booked for this visitor at {}",
            existing.start_at.to_rfc3339()
        )));
    }
    Ok(())
}

fn ensure_transition(reservation: &MeetingReservation, next: ReservationStatus) -> Result<()> {
    if reservation.status.can_transition_to(next) {
        Ok(())
    } else {
        Err(RendezvousError::Conflict(format!(
            "reservation is {} and cannot become {next}",
            reservation.status
        )))
    }
}
