//! Availability calculator
//!
//! Renders open meeting slots for a run of local calendar days. Busy time is
//! fetched once for the whole horizon, buffered and merged once, then each
//! day's workday is cut into consecutive slots.

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use rendezvous_domain::constants::{MAX_HORIZON_DAYS, MIN_LEAD_TIME_MINUTES};
use rendezvous_domain::{
    AvailabilityDay, AvailabilityQuery, AvailabilityResponse, AvailabilitySlot, RendezvousError,
    Result, SchedulingConfig, TimeWindow,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use super::guard::{ExternalCallGuard, SharedClock};
use super::ports::{AvailabilityStore, CalendarClient};
use super::windows::expand_and_merge;

/// RFC 3339 identifier of a slot
pub fn slot_id(start: DateTime<Utc>) -> String {
    start.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

/// UTC instant of `hour:00` local time on `date`
///
/// Hour 24 means midnight at the end of `date`. A local time skipped by a
/// DST transition resolves to the first valid instant after the gap.
pub fn local_hour_to_utc(tz: Tz, date: NaiveDate, hour: u32) -> Result<DateTime<Utc>> {
    let (date, hour) = if hour == 24 {
        let next = date.succ_opt().ok_or_else(|| {
            RendezvousError::InvalidInput(format!("date {date} is out of range"))
        })?;
        (next, 0)
    } else {
        (date, hour)
    };

    let time = NaiveTime::from_hms_opt(hour, 0, 0)
        .ok_or_else(|| RendezvousError::Config(format!("invalid workday hour {hour}")))?;
    let naive = date.and_time(time);

    if let Some(local) = tz.from_local_datetime(&naive).earliest() {
        return Ok(local.with_timezone(&Utc));
    }

    // Inside a DST gap: walk forward until the local clock exists again
    (1..=4)
        .map(|step| naive + Duration::minutes(30 * step))
        .find_map(|shifted| tz.from_local_datetime(&shifted).earliest())
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| RendezvousError::Internal(format!("cannot resolve {naive} in {tz}")))
}

/// Availability service
pub struct AvailabilityService {
    store: Arc<dyn AvailabilityStore>,
    calendar: Option<Arc<dyn CalendarClient>>,
    guard: ExternalCallGuard,
    config: SchedulingConfig,
    tz: Tz,
    clock: SharedClock,
}

impl AvailabilityService {
    /// Create a new availability service
    ///
    /// Fails with `RendezvousError::Config` when the workday is empty or the
    /// timezone is unknown.
    pub fn new(
        store: Arc<dyn AvailabilityStore>,
        guard: ExternalCallGuard,
        config: SchedulingConfig,
        clock: SharedClock,
    ) -> Result<Self> {
        config.validate()?;
        let tz = config.tz()?;
        Ok(Self { store, calendar: None, guard, config, tz, clock })
    }

    /// Also subtract busy time from the external calendar
    pub fn with_calendar(mut self, calendar: Arc<dyn CalendarClient>) -> Self {
        self.calendar = Some(calendar);
        self
    }

    /// Timezone slots are laid out in
    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Compute the availability calendar
    ///
    /// Read failures of either busy-time source are logged and the remaining
    /// windows are used; only configuration problems fail the call.
    #[instrument(skip(self, cancel), fields(timezone = %self.tz))]
    pub async fn get_availability(
        &self,
        cancel: &CancellationToken,
        query: AvailabilityQuery,
    ) -> Result<AvailabilityResponse> {
        let now = self.clock.utc_now();
        let start_date =
            query.start_date.unwrap_or_else(|| now.with_timezone(&self.tz).date_naive());
        let horizon =
            query.horizon_days.unwrap_or(self.config.horizon_days).clamp(1, MAX_HORIZON_DAYS);

        let days: Vec<(NaiveDate, DateTime<Utc>, DateTime<Utc>)> = start_date
            .iter_days()
            .take(horizon as usize)
            .map(|date| {
                let day_start = local_hour_to_utc(self.tz, date, self.config.workday_start_hour)?;
                let day_end = local_hour_to_utc(self.tz, date, self.config.workday_end_hour)?;
                Ok((date, day_start, day_end))
            })
            .collect::<Result<_>>()?;

        let (Some(first), Some(last)) = (days.first(), days.last()) else {
            return Ok(self.response(now, Vec::new()));
        };

        let buffer = self.config.buffer();
        let range_start = first.1 - buffer;
        let range_end = last.2 + buffer;

        let busy = self.busy_windows(cancel, range_start, range_end).await;
        let merged = expand_and_merge(&busy, buffer);
        debug!(windows = busy.len(), merged = merged.len(), "busy windows merged");

        let slot = self.config.slot_duration();
        let bookable_from = now + Duration::minutes(MIN_LEAD_TIME_MINUTES);
        let mut next_window = 0;

        let days = days
            .into_iter()
            .map(|(date, day_start, day_end)| {
                let mut slots = Vec::new();
                let mut cursor = day_start;

                while cursor + slot <= day_end {
                    let end = cursor + slot;

                    // merged is sorted and disjoint; skip windows already behind the cursor
                    while merged.get(next_window).is_some_and(|w| w.end() <= cursor) {
                        next_window += 1;
                    }
                    let blocked = merged.get(next_window).is_some_and(|w| w.overlaps(cursor, end));

                    if !blocked {
                        slots.push(AvailabilitySlot {
                            id: slot_id(cursor),
                            start: cursor,
                            end,
                            is_bookable: cursor >= bookable_from,
                        });
                    }
                    cursor = end;
                }

                AvailabilityDay { date, slots }
            })
            .collect();

        Ok(self.response(now, days))
    }

    fn response(&self, now: DateTime<Utc>, days: Vec<AvailabilityDay>) -> AvailabilityResponse {
        AvailabilityResponse { timezone: self.tz.name().to_string(), generated_at: now, days }
    }

    async fn busy_windows(
        &self,
        cancel: &CancellationToken,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Vec<TimeWindow> {
        let mut windows = match self.store.list_busy_windows(from, to).await {
            Ok(windows) => windows,
            Err(err) => {
                warn!(error = %err, "local busy windows unavailable, continuing without them");
                Vec::new()
            }
        };

        if let Some(calendar) = &self.calendar {
            let calendar_id = self.config.calendar_id.as_str();
            let external = self
                .guard
                .calendar(cancel, "list calendar busy windows", || {
                    calendar.list_busy_windows(calendar_id, from, to)
                })
                .await;

            match external {
                Ok(external) => windows.extend(external),
                Err(err) => {
                    warn!(
                        error = %err,
                        "calendar busy windows unavailable, continuing without them"
                    );
                }
            }
        }

        windows
    }
}
