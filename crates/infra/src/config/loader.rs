//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If a required variable is missing, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! Whatever the source, the result is validated before it is returned.
//!
//! ## Environment Variables
//! Required:
//! - `RENDEZVOUS_DB_PATH`: Database file path
//! - `RENDEZVOUS_TIMEZONE`: IANA timezone of the calendar owner
//! - `RENDEZVOUS_CALENDAR_ID`: Calendar to read and write
//!
//! Optional (defaults in brackets):
//! - `RENDEZVOUS_DB_POOL_SIZE` [4]
//! - `RENDEZVOUS_WORKDAY_START_HOUR` [9], `RENDEZVOUS_WORKDAY_END_HOUR` [18]
//! - `RENDEZVOUS_SLOT_MINUTES` [30], `RENDEZVOUS_BUFFER_MINUTES` [15]
//! - `RENDEZVOUS_HORIZON_DAYS` [14], `RENDEZVOUS_LOOKUP_SALT` [empty]
//! - `RENDEZVOUS_MAX_RETRIES` [3], `RENDEZVOUS_INITIAL_BACKOFF_MS` [500],
//!   `RENDEZVOUS_BACKOFF_MULTIPLIER` [2.0], `RENDEZVOUS_MAX_BACKOFF_MS` [10000],
//!   `RENDEZVOUS_ATTEMPT_TIMEOUT_MS` [8000]
//! - `RENDEZVOUS_CIRCUIT_FAILURE_THRESHOLD` [5],
//!   `RENDEZVOUS_CIRCUIT_OPEN_SECONDS` [30]
//! - `RENDEZVOUS_MAIL_SENDER`, `RENDEZVOUS_MAIL_RECEIVERS` (comma separated),
//!   `RENDEZVOUS_MAIL_SUBJECT_PREFIX` [`[Meeting]`]
//! - `RENDEZVOUS_GOOGLE_CLIENT_ID`, `RENDEZVOUS_GOOGLE_CLIENT_SECRET`,
//!   `RENDEZVOUS_GOOGLE_REFRESH_TOKEN`
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./rendezvous.toml` or `./rendezvous.json` (current working directory)
//! 2. `./config.toml` or `./config.json` (current working directory)
//! 3. The same names in the parent and grandparent directory
//! 4. The same names relative to the executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use rendezvous_domain::{
    Config, DatabaseConfig, GoogleConfig, NotificationConfig, RendezvousError, ResilienceConfig,
    Result, SchedulingConfig,
};

const CONFIG_FILE_NAMES: [&str; 4] =
    ["rendezvous.toml", "rendezvous.json", "config.toml", "config.json"];

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `RendezvousError::Config` if no source yields a configuration or
/// the loaded configuration fails validation.
pub fn load() -> Result<Config> {
    let config = match load_from_env() {
        Ok(config) => {
            tracing::info!("configuration loaded from environment variables");
            config
        }
        Err(e) => {
            tracing::debug!(error = %e, "environment incomplete, trying config file");
            load_from_file(None)?
        }
    };

    config.validate()?;
    Ok(config)
}

/// Load configuration from environment variables
///
/// # Errors
/// Returns `RendezvousError::Config` if required variables are missing or a
/// value cannot be parsed.
pub fn load_from_env() -> Result<Config> {
    let database = DatabaseConfig {
        path: env_var("RENDEZVOUS_DB_PATH")?,
        pool_size: env_parse("RENDEZVOUS_DB_POOL_SIZE", DatabaseConfig::default().pool_size)?,
    };

    let scheduling_defaults = SchedulingConfig::default();
    let scheduling = SchedulingConfig {
        timezone: env_var("RENDEZVOUS_TIMEZONE")?,
        workday_start_hour: env_parse(
            "RENDEZVOUS_WORKDAY_START_HOUR",
            scheduling_defaults.workday_start_hour,
        )?,
        workday_end_hour: env_parse(
            "RENDEZVOUS_WORKDAY_END_HOUR",
            scheduling_defaults.workday_end_hour,
        )?,
        slot_duration_minutes: env_parse(
            "RENDEZVOUS_SLOT_MINUTES",
            scheduling_defaults.slot_duration_minutes,
        )?,
        buffer_minutes: env_parse("RENDEZVOUS_BUFFER_MINUTES", scheduling_defaults.buffer_minutes)?,
        horizon_days: env_parse("RENDEZVOUS_HORIZON_DAYS", scheduling_defaults.horizon_days)?,
        calendar_id: env_var("RENDEZVOUS_CALENDAR_ID")?,
        lookup_salt: std::env::var("RENDEZVOUS_LOOKUP_SALT").unwrap_or_default(),
    };

    let resilience_defaults = ResilienceConfig::default();
    let resilience = ResilienceConfig {
        max_retries: env_parse("RENDEZVOUS_MAX_RETRIES", resilience_defaults.max_retries)?,
        initial_backoff_ms: env_parse(
            "RENDEZVOUS_INITIAL_BACKOFF_MS",
            resilience_defaults.initial_backoff_ms,
        )?,
        backoff_multiplier: env_parse(
            "RENDEZVOUS_BACKOFF_MULTIPLIER",
            resilience_defaults.backoff_multiplier,
        )?,
        max_backoff_ms: env_parse("RENDEZVOUS_MAX_BACKOFF_MS", resilience_defaults.max_backoff_ms)?,
        attempt_timeout_ms: env_parse(
            "RENDEZVOUS_ATTEMPT_TIMEOUT_MS",
            resilience_defaults.attempt_timeout_ms,
        )?,
        circuit_failure_threshold: env_parse(
            "RENDEZVOUS_CIRCUIT_FAILURE_THRESHOLD",
            resilience_defaults.circuit_failure_threshold,
        )?,
        circuit_open_seconds: env_parse(
            "RENDEZVOUS_CIRCUIT_OPEN_SECONDS",
            resilience_defaults.circuit_open_seconds,
        )?,
    };

    let notification = NotificationConfig {
        sender: std::env::var("RENDEZVOUS_MAIL_SENDER").unwrap_or_default(),
        receivers: std::env::var("RENDEZVOUS_MAIL_RECEIVERS")
            .map(|list| split_list(&list))
            .unwrap_or_default(),
        subject_prefix: std::env::var("RENDEZVOUS_MAIL_SUBJECT_PREFIX")
            .unwrap_or_else(|_| NotificationConfig::default().subject_prefix),
    };

    let google = GoogleConfig {
        client_id: env_opt("RENDEZVOUS_GOOGLE_CLIENT_ID"),
        client_secret: env_opt("RENDEZVOUS_GOOGLE_CLIENT_SECRET"),
        refresh_token: env_opt("RENDEZVOUS_GOOGLE_REFRESH_TOKEN"),
        ..GoogleConfig::default()
    };

    Ok(Config { database, scheduling, resilience, notification, google })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations. The format is chosen
/// by file extension.
///
/// # Errors
/// Returns `RendezvousError::Config` if the file is missing, unreadable or
/// malformed.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(RendezvousError::Config(format!(
                    "config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            RendezvousError::Config("no config file found in any of the standard locations".into())
        })?,
    };

    tracing::info!(path = %config_path.display(), "loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| RendezvousError::Config(format!("failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| RendezvousError::Config(format!("invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| RendezvousError::Config(format!("invalid JSON format: {e}"))),
        _ => Err(RendezvousError::Config(format!("unsupported config format: {extension}"))),
    }
}

/// First existing config file among the standard locations
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        roots.extend([cwd.clone(), cwd.join(".."), cwd.join("../..")]);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            roots.extend([exe_dir.to_path_buf(), exe_dir.join(".."), exe_dir.join("../..")]);
        }
    }

    roots
        .iter()
        .flat_map(|root| CONFIG_FILE_NAMES.iter().map(move |name| root.join(name)))
        .find(|path| path.exists())
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        RendezvousError::Config(format!("missing required environment variable: {key}"))
    })
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Parse an optional variable, falling back to `default` when unset
fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| RendezvousError::Config(format!("invalid value for {key}: {e}"))),
        Err(_) => Ok(default),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect()
}
