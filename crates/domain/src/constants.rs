//! Application constants
//!
//! Centralized location for domain-level constants used throughout the
//! application.

// Booking rules
pub const MIN_LEAD_TIME_MINUTES: i64 = 15;
pub const MAX_MEETING_DURATION_MINUTES: u32 = 240;
pub const MAX_NAME_LENGTH: usize = 120;
pub const MAX_TOPIC_LENGTH: usize = 200;
pub const MAX_MESSAGE_LENGTH: usize = 4000;

// Scheduling defaults
pub const DEFAULT_TIMEZONE: &str = "UTC";
pub const DEFAULT_WORKDAY_START_HOUR: u32 = 9;
pub const DEFAULT_WORKDAY_END_HOUR: u32 = 18;
pub const DEFAULT_SLOT_DURATION_MINUTES: u32 = 30;
pub const DEFAULT_BUFFER_MINUTES: u32 = 15;
pub const DEFAULT_HORIZON_DAYS: u32 = 14;
pub const MAX_HORIZON_DAYS: u32 = 90;
pub const DEFAULT_CALENDAR_ID: &str = "primary";

// Resilience defaults
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_INITIAL_BACKOFF_MS: u64 = 500;
pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;
pub const DEFAULT_MAX_BACKOFF_MS: u64 = 10_000;
pub const DEFAULT_ATTEMPT_TIMEOUT_MS: u64 = 8_000;
pub const DEFAULT_CIRCUIT_FAILURE_THRESHOLD: u32 = 5;
pub const DEFAULT_CIRCUIT_OPEN_SECONDS: u64 = 30;

// Notifications
pub const DEFAULT_SUBJECT_PREFIX: &str = "[Meeting]";

// Google endpoints
pub const GOOGLE_CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";
pub const GOOGLE_GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1";
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

// Storage
pub const DEFAULT_DATABASE_PATH: &str = "rendezvous.db";
pub const DEFAULT_POOL_SIZE: u32 = 4;
