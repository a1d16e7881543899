//! Configuration management

use std::time::Duration;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_ATTEMPT_TIMEOUT_MS, DEFAULT_BACKOFF_MULTIPLIER, DEFAULT_BUFFER_MINUTES,
    DEFAULT_CALENDAR_ID, DEFAULT_CIRCUIT_FAILURE_THRESHOLD, DEFAULT_CIRCUIT_OPEN_SECONDS,
    DEFAULT_DATABASE_PATH, DEFAULT_HORIZON_DAYS, DEFAULT_INITIAL_BACKOFF_MS,
    DEFAULT_MAX_BACKOFF_MS, DEFAULT_MAX_RETRIES, DEFAULT_POOL_SIZE,
    DEFAULT_SLOT_DURATION_MINUTES, DEFAULT_SUBJECT_PREFIX, DEFAULT_TIMEZONE,
    DEFAULT_WORKDAY_END_HOUR, DEFAULT_WORKDAY_START_HOUR, GOOGLE_CALENDAR_API_BASE,
    GOOGLE_GMAIL_API_BASE, GOOGLE_TOKEN_URL, MAX_HORIZON_DAYS,
};
use crate::errors::{RendezvousError, Result};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub scheduling: SchedulingConfig,
    pub resilience: ResilienceConfig,
    pub notification: NotificationConfig,
    pub google: GoogleConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
    pub pool_size: u32,
}

/// Working hours, slot geometry and calendar selection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SchedulingConfig {
    /// IANA timezone identifier, e.g. `Europe/Berlin`
    pub timezone: String,
    pub workday_start_hour: u32,
    pub workday_end_hour: u32,
    pub slot_duration_minutes: u32,
    /// Margin kept free before and after every busy window
    pub buffer_minutes: u32,
    pub horizon_days: u32,
    pub calendar_id: String,
    /// Mixed into reservation lookup hashes
    #[serde(skip_serializing)]
    pub lookup_salt: String,
}

/// Retry and circuit breaker settings for external calls
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ResilienceConfig {
    /// Total attempts per external call, including the first
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub backoff_multiplier: f64,
    pub max_backoff_ms: u64,
    pub attempt_timeout_ms: u64,
    pub circuit_failure_threshold: u32,
    pub circuit_open_seconds: u64,
}

/// Confirmation mail settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NotificationConfig {
    pub sender: String,
    /// Owner addresses copied on every confirmation
    pub receivers: Vec<String>,
    pub subject_prefix: String,
}

/// Google API credentials and endpoints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GoogleConfig {
    pub client_id: Option<String>,
    #[serde(skip_serializing)]
    pub client_secret: Option<String>,
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,
    pub calendar_api_base: String,
    pub gmail_api_base: String,
    pub token_url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: DEFAULT_DATABASE_PATH.to_string(), pool_size: DEFAULT_POOL_SIZE }
    }
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            timezone: DEFAULT_TIMEZONE.to_string(),
            workday_start_hour: DEFAULT_WORKDAY_START_HOUR,
            workday_end_hour: DEFAULT_WORKDAY_END_HOUR,
            slot_duration_minutes: DEFAULT_SLOT_DURATION_MINUTES,
            buffer_minutes: DEFAULT_BUFFER_MINUTES,
            horizon_days: DEFAULT_HORIZON_DAYS,
            calendar_id: DEFAULT_CALENDAR_ID.to_string(),
            lookup_salt: String::new(),
        }
    }
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_backoff_ms: DEFAULT_INITIAL_BACKOFF_MS,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
            max_backoff_ms: DEFAULT_MAX_BACKOFF_MS,
            attempt_timeout_ms: DEFAULT_ATTEMPT_TIMEOUT_MS,
            circuit_failure_threshold: DEFAULT_CIRCUIT_FAILURE_THRESHOLD,
            circuit_open_seconds: DEFAULT_CIRCUIT_OPEN_SECONDS,
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            sender: String::new(),
            receivers: Vec::new(),
            subject_prefix: DEFAULT_SUBJECT_PREFIX.to_string(),
        }
    }
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            refresh_token: None,
            calendar_api_base: GOOGLE_CALENDAR_API_BASE.to_string(),
            gmail_api_base: GOOGLE_GMAIL_API_BASE.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
        }
    }
}

impl Config {
    /// Reject settings the scheduling engine cannot work with
    pub fn validate(&self) -> Result<()> {
        self.scheduling.validate()?;
        self.resilience.validate()?;

        if self.database.pool_size == 0 {
            return Err(RendezvousError::Config("database.pool_size must be positive".into()));
        }

        Ok(())
    }
}

impl SchedulingConfig {
    /// Parsed timezone
    pub fn tz(&self) -> Result<Tz> {
        self.timezone.parse::<Tz>().map_err(|_| {
            RendezvousError::Config(format!("unknown timezone '{}'", self.timezone))
        })
    }

    /// Length of one bookable slot
    pub fn slot_duration(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.slot_duration_minutes))
    }

    /// Margin kept around busy time
    pub fn buffer(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.buffer_minutes))
    }

    /// Reject an empty workday, unknown timezones and out-of-range values
    pub fn validate(&self) -> Result<()> {
        self.tz()?;

        if self.workday_start_hour > 24 || self.workday_end_hour > 24 {
            return Err(RendezvousError::Config("workday hours must be within 0..=24".into()));
        }
        if self.workday_end_hour <= self.workday_start_hour {
            return Err(RendezvousError::Config(format!(
                "workday_end_hour ({}) must be after workday_start_hour ({})",
                self.workday_end_hour, self.workday_start_hour
            )));
        }
        if self.slot_duration_minutes == 0 {
            return Err(RendezvousError::Config("slot_duration_minutes must be positive".into()));
        }
        if self.horizon_days > MAX_HORIZON_DAYS {
            return Err(RendezvousError::Config(format!(
                "horizon_days must not exceed {MAX_HORIZON_DAYS}"
            )));
        }
        if self.calendar_id.trim().is_empty() {
            return Err(RendezvousError::Config("calendar_id must not be empty".into()));
        }

        Ok(())
    }
}

impl ResilienceConfig {
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }

    /// Upper bound on a single external call
    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.attempt_timeout_ms)
    }

    pub fn circuit_open_duration(&self) -> Duration {
        Duration::from_secs(self.circuit_open_seconds)
    }

    /// Reject settings the retry executor cannot honour
    pub fn validate(&self) -> Result<()> {
        if self.max_retries == 0 {
            return Err(RendezvousError::Config("max_retries must be at least 1".into()));
        }
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            return Err(RendezvousError::Config(format!(
                "backoff_multiplier must be at least 1.0, got {}",
                self.backoff_multiplier
            )));
        }
        if self.max_backoff_ms < self.initial_backoff_ms {
            return Err(RendezvousError::Config(
                "max_backoff_ms must not be smaller than initial_backoff_ms".into(),
            ));
        }
        if self.attempt_timeout_ms == 0 {
            return Err(RendezvousError::Config("attempt_timeout_ms must be positive".into()));
        }
        if self.circuit_failure_threshold == 0 {
            return Err(RendezvousError::Config(
                "circuit_failure_threshold must be at least 1".into(),
            ));
        }

        Ok(())
    }
}
