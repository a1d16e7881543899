//! Google adapters against a mocked API surface

mod support;

use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use rendezvous_common::SystemClock;
use rendezvous_core::scheduling::{CalendarClient, ExternalCallGuard, MailClient, SharedClock};
use rendezvous_domain::{
    CalendarEventRequest, GoogleConfig, MailMessage, RendezvousError, ResilienceConfig,
    WindowSource,
};
use rendezvous_infra::{GmailClient, GoogleCalendarClient, GoogleTokenProvider, HttpClient};
use serde_json::json;
use support::tuesday;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

async fn mount_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "tok", "expires_in": 3600})),
        )
        .mount(server)
        .await;
}

fn tokens(server: &MockServer) -> Arc<GoogleTokenProvider> {
    let config = GoogleConfig {
        client_id: Some("client".into()),
        client_secret: Some("secret".into()),
        refresh_token: Some("refresh".into()),
        token_url: format!("{}/token", server.uri()),
        ..GoogleConfig::default()
    };
    Arc::new(GoogleTokenProvider::new(HttpClient::new().unwrap(), &config))
}

fn calendar(server: &MockServer) -> GoogleCalendarClient {
    GoogleCalendarClient::new(HttpClient::new().unwrap(), tokens(server), &server.uri())
}

fn event() -> CalendarEventRequest {
    CalendarEventRequest {
        summary: "Meeting with Ada Lovelace".into(),
        description: "Topic: engines".into(),
        start: tuesday(10, 0),
        end: tuesday(10, 30),
        attendees: vec!["ada@example.com".into()],
        time_zone: "Europe/Berlin".into(),
    }
}

#[tokio::test]
async fn test_free_busy_returns_external_windows() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("POST"))
        .and(path("/freeBusy"))
        .and(header("authorization", "Bearer tok"))
        .and(body_partial_json(json!({"items": [{"id": "owner@example.com"}]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "kind": "calendar#freeBusy",
            "calendars": {
                "owner@example.com": {
                    "busy": [
                        {"start": "2026-03-03T10:00:00Z", "end": "2026-03-03T11:00:00Z"},
                        {"start": "2026-03-03T15:30:00+01:00", "end": "2026-03-03T16:00:00+01:00"}
                    ]
                }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let windows = calendar(&server)
        .list_busy_windows("owner@example.com", tuesday(0, 0), tuesday(23, 0))
        .await
        .unwrap();

    assert_eq!(windows.len(), 2);
    assert_eq!(windows[0].start(), tuesday(10, 0));
    assert_eq!(windows[1].start(), tuesday(14, 30));
    assert!(windows.iter().all(|w| w.source() == WindowSource::External));
}

#[tokio::test]
async fn test_free_busy_calendar_errors_are_reported() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("POST"))
        .and(path("/freeBusy"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "calendars": {
                "missing@example.com": {"errors": [{"domain": "global", "reason": "notFound"}]}
            }
        })))
        .mount(&server)
        .await;

    let err = calendar(&server)
        .list_busy_windows("missing@example.com", tuesday(0, 0), tuesday(23, 0))
        .await
        .unwrap_err();

    assert!(matches!(err, RendezvousError::NotFound(_)));
}

#[tokio::test]
async fn test_create_event_requests_meet_link() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("POST"))
        .and(path("/calendars/owner%40example.com/events"))
        .and(query_param("conferenceDataVersion", "1"))
        .and(query_param("sendUpdates", "all"))
        .and(body_partial_json(json!({
            "summary": "Meeting with Ada Lovelace",
            "attendees": [{"email": "ada@example.com"}],
            "start": {"timeZone": "Europe/Berlin"},
            "conferenceData": {"createRequest": {"conferenceSolutionKey": {"type": "hangoutsMeet"}}}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "evt-1",
            "status": "confirmed",
            "htmlLink": "https://calendar.example/evt-1",
            "hangoutLink": "https://meet.example/abc-defg-hij"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let created = calendar(&server).create_event("owner@example.com", &event()).await.unwrap();

    assert_eq!(created.id, "evt-1");
    assert_eq!(created.status.as_deref(), Some("confirmed"));
    assert_eq!(created.meeting_url().as_deref(), Some("https://meet.example/abc-defg-hij"));
}

#[tokio::test]
async fn test_revoked_access_maps_to_unauthorized() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("POST"))
        .and(path("/freeBusy"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid Credentials"))
        .expect(1)
        .mount(&server)
        .await;

    let err = calendar(&server)
        .list_busy_windows("owner@example.com", tuesday(0, 0), tuesday(23, 0))
        .await
        .unwrap_err();

    assert!(matches!(err, RendezvousError::Unauthorized(_)));
}

#[tokio::test]
async fn test_missing_credentials_never_reach_the_api() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config =
        GoogleConfig { token_url: format!("{}/token", server.uri()), ..GoogleConfig::default() };
    let tokens = Arc::new(GoogleTokenProvider::new(HttpClient::new().unwrap(), &config));
    let client = GoogleCalendarClient::new(HttpClient::new().unwrap(), tokens, &server.uri());

    let err = client.create_event("owner@example.com", &event()).await.unwrap_err();
    assert!(matches!(err, RendezvousError::Unauthorized(_)));
}

#[tokio::test]
async fn test_gmail_sends_base64url_rfc2822_message() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("POST"))
        .and(path("/users/me/messages/send"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "msg-1"})))
        .expect(1)
        .mount(&server)
        .await;

    let gmail = GmailClient::new(HttpClient::new().unwrap(), tokens(&server), &server.uri());
    gmail
        .send(&MailMessage {
            from: "owner@example.com".into(),
            to: vec!["ada@example.com".into()],
            cc: vec!["assistant@example.com".into()],
            subject: "[Meeting] Booked".into(),
            body: "See you soon".into(),
        })
        .await
        .unwrap();

    let requests: Vec<Request> = server.received_requests().await.unwrap();
    let send = requests.iter().find(|r| r.url.path() == "/users/me/messages/send").unwrap();
    let payload: serde_json::Value = serde_json::from_slice(&send.body).unwrap();
    let raw = URL_SAFE.decode(payload["raw"].as_str().unwrap()).unwrap();
    let rendered = String::from_utf8(raw).unwrap();

    assert!(rendered.contains("To: ada@example.com\r\n"));
    assert!(rendered.contains("Cc: assistant@example.com\r\n"));
    assert!(rendered.contains("Subject: [Meeting] Booked\r\n"));
}

#[tokio::test]
async fn test_gmail_rejects_message_without_recipients() {
    let server = MockServer::start().await;
    let gmail = GmailClient::new(HttpClient::new().unwrap(), tokens(&server), &server.uri());

    let err = gmail
        .send(&MailMessage {
            from: "owner@example.com".into(),
            to: vec![],
            cc: vec![],
            subject: "x".into(),
            body: "y".into(),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, RendezvousError::InvalidInput(_)));
}

#[tokio::test]
async fn test_guard_retries_transient_calendar_failures() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("POST"))
        .and(path("/calendars/owner%40example.com/events"))
        .respond_with(ResponseTemplate::new(503).set_body_string("backend error"))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/calendars/owner%40example.com/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "evt-2"})))
        .with_priority(2)
        .mount(&server)
        .await;

    let clock: SharedClock = Arc::new(SystemClock);
    let guard = ExternalCallGuard::new(
        &ResilienceConfig {
            max_retries: 3,
            initial_backoff_ms: 10,
            backoff_multiplier: 2.0,
            max_backoff_ms: 50,
            attempt_timeout_ms: 5_000,
            circuit_failure_threshold: 5,
            circuit_open_seconds: 30,
        },
        clock,
    )
    .unwrap();
    let client = calendar(&server);
    let request = event();

    let created = guard
        .calendar(&CancellationToken::new(), "create calendar event", || {
            client.create_event("owner@example.com", &request)
        })
        .await
        .unwrap();

    assert_eq!(created.id, "evt-2");
    let attempts = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path().ends_with("/events"))
        .count();
    assert_eq!(attempts, 2);
}
