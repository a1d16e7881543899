use std::time::{Duration, Instant};

use rendezvous_domain::RendezvousError;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Log the outcome of a command execution with structured fields.
///
/// `command` must be a stable identifier (e.g. `"booking::book_meeting"`);
/// callers never pass visitor data through it.
#[inline]
pub fn log_command_execution(command: &str, elapsed: Duration, success: bool) {
    let duration_ms = elapsed.as_millis() as u64;

    if success {
        info!(command, duration_ms, "command_execution_success");
    } else {
        warn!(command, duration_ms, "command_execution_failure");
    }
}

/// Convert a `RendezvousError` into a stable label suitable for logging.
#[inline]
pub fn error_label(error: &RendezvousError) -> &'static str {
    error.kind()
}

/// Log a finished command, labelling the error kind on failure.
pub fn log_command_result<T>(
    command: &str,
    started: Instant,
    result: &Result<T, RendezvousError>,
) {
    let elapsed = started.elapsed();
    log_command_execution(command, elapsed, result.is_ok());

    if let Err(err) = result {
        warn!(command, error_type = error_label(err), error = %err, "command returned error");
    }
}

/// Install the global subscriber.
///
/// Filtering follows `RUST_LOG` (default `info`); `RENDEZVOUS_LOG_FORMAT=json`
/// switches to JSON lines. Returns false if a subscriber was already set.
pub fn init_tracing() -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("RENDEZVOUS_LOG_FORMAT")
        .map(|value| value.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
    let installed =
        if json { builder.json().try_init() } else { builder.with_target(false).try_init() };

    installed.is_ok()
}
