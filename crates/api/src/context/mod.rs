//! Application context - dependency injection container

use std::sync::Arc;

use rendezvous_common::SystemClock;
use rendezvous_core::scheduling::{
    AvailabilityService, BookingPorts, BookingService, CalendarClient, ExternalCallGuard,
    MailClient, SharedClock,
};
use rendezvous_domain::{Config, Result};
use rendezvous_infra::{
    config, DbManager, GmailClient, GoogleCalendarClient, GoogleTokenProvider, HttpClient,
    SqliteBlacklistStore, SqliteNotificationLog, SqliteReservationStore,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const USER_AGENT: &str = concat!("rendezvous/", env!("CARGO_PKG_VERSION"));

/// External collaborators of the booking flow
#[derive(Clone)]
pub struct Integrations {
    pub calendar: Arc<dyn CalendarClient>,
    pub mail: Arc<dyn MailClient>,
}

impl Integrations {
    /// Google Calendar and Gmail sharing one token provider
    pub fn google(config: &Config) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(config.resilience.attempt_timeout())
            .user_agent(USER_AGENT)
            .build()?;

        let tokens = Arc::new(GoogleTokenProvider::new(http.clone(), &config.google));
        if !tokens.has_credentials() {
            warn!("google credentials are not configured; calendar and mail calls will fail");
        }

        let calendar = GoogleCalendarClient::new(
            http.clone(),
            Arc::clone(&tokens),
            &config.google.calendar_api_base,
        );
        let mail = GmailClient::new(http, tokens, &config.google.gmail_api_base);

        Ok(Self { calendar: Arc::new(calendar), mail: Arc::new(mail) })
    }
}

/// Application context - holds all services and dependencies
pub struct AppContext {
    pub config: Config,
    pub db: Arc<DbManager>,
    pub reservations: Arc<SqliteReservationStore>,
    pub blacklist: Arc<SqliteBlacklistStore>,
    pub notifications: Arc<SqliteNotificationLog>,
    pub availability: Arc<AvailabilityService>,
    pub booking: Arc<BookingService>,
    pub clock: SharedClock,
    shutdown: CancellationToken,
}

impl AppContext {
    /// Create a context from the environment or the first config file found
    pub fn new() -> Result<Self> {
        Self::new_with_config(config::load()?)
    }

    /// Create a context with the Google integrations
    pub fn new_with_config(config: Config) -> Result<Self> {
        let integrations = Integrations::google(&config)?;
        Self::new_with_integrations(config, integrations, Arc::new(SystemClock))
    }

    /// Create a context with custom collaborators
    ///
    /// Tests use this to substitute the calendar, mail and clock.
    pub fn new_with_integrations(
        config: Config,
        integrations: Integrations,
        clock: SharedClock,
    ) -> Result<Self> {
        config.validate()?;

        let db = Arc::new(DbManager::new(&config.database.path, config.database.pool_size)?);
        db.run_migrations()?;

        let reservations = Arc::new(SqliteReservationStore::new(Arc::clone(&db)));
        let blacklist = Arc::new(SqliteBlacklistStore::new(Arc::clone(&db)));
        let notifications = Arc::new(SqliteNotificationLog::new(Arc::clone(&db)));

        // One guard so both services trip the same calendar breaker
        let guard = ExternalCallGuard::new(&config.resilience, Arc::clone(&clock))?;

        let availability = AvailabilityService::new(
            reservations.clone(),
            guard.clone(),
            config.scheduling.clone(),
            Arc::clone(&clock),
        )?
        .with_calendar(Arc::clone(&integrations.calendar));

        let ports = BookingPorts {
            availability: reservations.clone(),
            blacklist: blacklist.clone(),
            reservations: reservations.clone(),
            notifications: notifications.clone(),
            calendar: integrations.calendar,
            mail: integrations.mail,
        };
        let booking = BookingService::new(
            ports,
            guard,
            config.scheduling.clone(),
            config.notification.clone(),
            Arc::clone(&clock),
        )?;

        info!(
            db_path = %db.path().display(),
            timezone = %config.scheduling.timezone,
            "application context initialised"
        );

        Ok(Self {
            config,
            db,
            reservations,
            blacklist,
            notifications,
            availability: Arc::new(availability),
            booking: Arc::new(booking),
            clock,
            shutdown: CancellationToken::new(),
        })
    }

    /// Token cancelled when the context shuts down
    pub fn cancellation_token(&self) -> CancellationToken {
        self.shutdown.child_token()
    }

    /// Abort in-flight external calls
    pub fn shutdown(&self) {
        info!("application context shutting down");
        self.shutdown.cancel();
    }

    /// Whether `shutdown` has been called
    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}
