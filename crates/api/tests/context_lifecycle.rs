//! Integration tests for AppContext lifecycle

mod support;

use std::sync::Arc;

use rendezvous_app::{AppContext, Integrations};
use rendezvous_core::scheduling::SharedClock;
use rendezvous_domain::RendezvousError;
use support::{test_config, FakeCalendar, FakeMail};
use tempfile::TempDir;

fn integrations() -> Integrations {
    Integrations {
        calendar: Arc::new(FakeCalendar::default()),
        mail: Arc::new(FakeMail::default()),
    }
}

fn clock() -> SharedClock {
    Arc::new(rendezvous_common::MockClock::at(support::now()))
}

#[test]
fn test_context_creates_and_migrates_database() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("rendezvous.db");

    let ctx = AppContext::new_with_integrations(
        test_config(db_path.to_string_lossy().to_string()),
        integrations(),
        clock(),
    )
    .expect("context should build");

    assert!(db_path.exists());
    ctx.db.health_check().expect("database should answer");
}

#[test]
fn test_context_can_be_rebuilt_on_existing_database() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("rendezvous.db").to_string_lossy().to_string();

    drop(AppContext::new_with_integrations(test_config(db_path.clone()), integrations(), clock()));
    AppContext::new_with_integrations(test_config(db_path), integrations(), clock())
        .expect("second context should reuse the schema");
}

#[test]
fn test_invalid_configuration_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = test_config(temp_dir.path().join("x.db").to_string_lossy().to_string());
    config.scheduling.workday_end_hour = config.scheduling.workday_start_hour;

    let result = AppContext::new_with_integrations(config, integrations(), clock());
    assert!(matches!(result, Err(RendezvousError::Config(_))));
}

#[test]
fn test_google_integrations_build_without_credentials() {
    let temp_dir = TempDir::new().unwrap();
    let config = test_config(temp_dir.path().join("x.db").to_string_lossy().to_string());

    let ctx = AppContext::new_with_config(config).expect("missing credentials only warn");
    assert!(!ctx.is_shut_down());
}

#[tokio::test]
async fn test_shutdown_cancels_outstanding_tokens() {
    let test = support::setup_test_context();
    let token = test.ctx.cancellation_token();

    test.ctx.shutdown();

    assert!(token.is_cancelled());
    assert!(test.ctx.is_shut_down());
}
