//! Booking and reservation lifecycle commands
//!
//! # Commands
//!
//! - `book_meeting` - Book a slot (idempotent per visitor and start time)
//! - `lookup_reservation` - Fetch a reservation by lookup hash
//! - `confirm_reservation` - Pending to confirmed
//! - `cancel_reservation` - Cancel and notify the visitor

use std::time::Instant;

use rendezvous_domain::{BookingRequest, BookingResult, MeetingReservation, Result};
use tracing::info;

use crate::context::AppContext;
use crate::utils::logging::log_command_result;

/// Book a meeting through the orchestrator
pub async fn book_meeting(ctx: &AppContext, request: BookingRequest) -> Result<BookingResult> {
    let command_name = "booking::book_meeting";
    let start = Instant::now();

    let result = ctx.booking.book(&ctx.cancellation_token(), request).await;
    if let Ok(booked) = &result {
        info!(
            command = command_name,
            reservation_id = booked.reservation.id,
            replayed = booked.replayed,
            "meeting booked"
        );
    }

    log_command_result(command_name, start, &result);
    result
}

/// Fetch a reservation by lookup hash
pub async fn lookup_reservation(ctx: &AppContext, lookup_hash: &str) -> Result<MeetingReservation> {
    let command_name = "booking::lookup_reservation";
    let start = Instant::now();

    let result = ctx.booking.lookup(lookup_hash).await;

    log_command_result(command_name, start, &result);
    result
}

/// Confirm a pending reservation
pub async fn confirm_reservation(
    ctx: &AppContext,
    lookup_hash: &str,
) -> Result<MeetingReservation> {
    let command_name = "booking::confirm_reservation";
    let start = Instant::now();

    let result = ctx.booking.confirm(lookup_hash).await;

    log_command_result(command_name, start, &result);
    result
}

/// Cancel a reservation and notify the visitor
pub async fn cancel_reservation(
    ctx: &AppContext,
    lookup_hash: &str,
    reason: Option<String>,
) -> Result<MeetingReservation> {
    let command_name = "booking::cancel_reservation";
    let start = Instant::now();

    let result = ctx.booking.cancel(&ctx.cancellation_token(), lookup_hash, reason).await;

    log_command_result(command_name, start, &result);
    result
}
