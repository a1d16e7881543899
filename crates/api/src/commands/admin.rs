//! Owner-side maintenance: blackouts, the blacklist and notification history

use std::time::Instant;

use chrono::{DateTime, Utc};
use rendezvous_common::Clock;
use rendezvous_core::scheduling::NotificationLog;
use rendezvous_domain::{BlacklistEntry, Blackout, MeetingNotification, Result};

use crate::context::AppContext;
use crate::utils::logging::log_command_result;

/// Block `[start_at, end_at)` for every visitor
pub async fn add_blackout(
    ctx: &AppContext,
    start_at: DateTime<Utc>,
    end_at: DateTime<Utc>,
    reason: Option<String>,
) -> Result<Blackout> {
    let command_name = "admin::add_blackout";
    let start = Instant::now();

    let result = ctx.reservations.add_blackout(start_at, end_at, reason).await;

    log_command_result(command_name, start, &result);
    result
}

/// Refuse future bookings from `email`
pub async fn add_blacklist_entry(
    ctx: &AppContext,
    email: &str,
    reason: &str,
) -> Result<BlacklistEntry> {
    let command_name = "admin::add_blacklist_entry";
    let start = Instant::now();

    let result = ctx.blacklist.add_blacklist_entry(email, reason, ctx.clock.utc_now()).await;

    log_command_result(command_name, start, &result);
    result
}

/// Mail attempts recorded for a reservation, oldest first
pub async fn list_notifications(
    ctx: &AppContext,
    lookup_hash: &str,
) -> Result<Vec<MeetingNotification>> {
    let command_name = "admin::list_notifications";
    let start = Instant::now();

    let result = match ctx.booking.lookup(lookup_hash).await {
        Ok(reservation) => ctx.notifications.list_for_reservation(reservation.id).await,
        Err(err) => Err(err),
    };

    log_command_result(command_name, start, &result);
    result
}
