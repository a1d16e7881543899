//! Google Calendar adapter for the scheduling engine

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Method;
use rendezvous_core::scheduling::CalendarClient;
use rendezvous_domain::{
    CalendarEventRequest, CreatedEvent, RendezvousError, Result, TimeWindow, WindowSource,
};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::auth::GoogleTokenProvider;
use super::types::{
    Attendee, ConferenceData, ConferenceSolutionKey, CreateConferenceRequest, EventInsert,
    EventResponse, EventTime, FreeBusyItem, FreeBusyRequest, FreeBusyResponse,
};
use crate::http::HttpClient;

/// Calendar v3 client: free/busy queries and event creation with a Meet link
pub struct GoogleCalendarClient {
    http: HttpClient,
    tokens: Arc<GoogleTokenProvider>,
    api_base: String,
}

impl GoogleCalendarClient {
    pub fn new(http: HttpClient, tokens: Arc<GoogleTokenProvider>, api_base: &str) -> Self {
        Self { http, tokens, api_base: api_base.trim_end_matches('/').to_string() }
    }

    async fn authorized(&self, method: Method, url: String) -> Result<reqwest::RequestBuilder> {
        let token = self.tokens.access_token().await?;
        Ok(self.http.request(method, url).bearer_auth(token))
    }

    /// A rejected token is dropped so the next call refreshes it
    async fn forget_token_on_auth_failure<T>(&self, result: Result<T>) -> Result<T> {
        if matches!(result, Err(RendezvousError::Unauthorized(_))) {
            self.tokens.invalidate().await;
        }
        result
    }
}

#[async_trait]
impl CalendarClient for GoogleCalendarClient {
    #[instrument(skip(self), fields(calendar_id))]
    async fn list_busy_windows(
        &self,
        calendar_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<TimeWindow>> {
        let body = FreeBusyRequest {
            time_min: from,
            time_max: to,
            items: vec![FreeBusyItem { id: calendar_id }],
        };
        let request =
            self.authorized(Method::POST, format!("{}/freeBusy", self.api_base)).await?.json(&body);
        let response: FreeBusyResponse =
            self.forget_token_on_auth_failure(self.http.send_json(request).await).await?;

        let Some(calendar) = response.calendars.into_values().next() else {
            return Err(RendezvousError::Network(format!(
                "free/busy response did not include calendar {calendar_id}"
            )));
        };

        if let Some(error) = calendar.errors.first() {
            return Err(match error.reason.as_str() {
                "notFound" => {
                    RendezvousError::NotFound(format!("calendar {calendar_id} not found"))
                }
                reason => RendezvousError::Network(format!("free/busy query failed: {reason}")),
            });
        }

        let windows: Vec<TimeWindow> = calendar
            .busy
            .into_iter()
            .filter_map(|period| {
                match TimeWindow::new(period.start, period.end, WindowSource::External) {
                    Ok(window) => Some(window),
                    Err(err) => {
                        warn!(
                            start = %period.start,
                            error = %err,
                            "skipping malformed busy period"
                        );
                        None
                    }
                }
            })
            .collect();

        debug!(count = windows.len(), "external busy windows loaded");
        Ok(windows)
    }

    #[instrument(skip(self, event), fields(calendar_id, start = %event.start))]
    async fn create_event(
        &self,
        calendar_id: &str,
        event: &CalendarEventRequest,
    ) -> Result<CreatedEvent> {
        let body = EventInsert {
            summary: &event.summary,
            description: &event.description,
            start: EventTime { date_time: event.start, time_zone: &event.time_zone },
            end: EventTime { date_time: event.end, time_zone: &event.time_zone },
            attendees: event.attendees.iter().map(|email| Attendee { email }).collect(),
            conference_data: ConferenceData {
                create_request: CreateConferenceRequest {
                    request_id: Uuid::new_v4().to_string(),
                    conference_solution_key: ConferenceSolutionKey { kind: "hangoutsMeet" },
                },
            },
        };

        let url = format!(
            "{}/calendars/{}/events?conferenceDataVersion=1&sendUpdates=all",
            self.api_base,
            urlencoding::encode(calendar_id)
        );
        let request = self.authorized(Method::POST, url).await?.json(&body);
        let created: EventResponse =
            self.forget_token_on_auth_failure(self.http.send_json(request).await).await?;

        debug!(event_id = %created.id, "calendar event created");
        Ok(CreatedEvent {
            id: created.id,
            html_link: created.html_link,
            hangout_link: created.hangout_link,
            status: created.status,
        })
    }
}
