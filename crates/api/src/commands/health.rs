use std::time::Instant;

use rendezvous_domain::Result;
use serde::Serialize;
use tracing::warn;

use crate::context::AppContext;
use crate::utils::logging::log_command_result;

/// Liveness of the database and the integration breakers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub database_ok: bool,
    pub calendar_circuit: String,
    pub mail_circuit: String,
    pub rejected_calls: u64,
}

/// Report health; a failing database is reported, not returned as an error
pub async fn health_check(ctx: &AppContext) -> Result<HealthReport> {
    let command_name = "health::health_check";
    let start = Instant::now();

    let db = ctx.db.clone();
    let database_ok = match tokio::task::spawn_blocking(move || db.health_check()).await {
        Ok(Ok(())) => true,
        Ok(Err(err)) => {
            warn!(error = %err, "database health check failed");
            false
        }
        Err(err) => {
            warn!(error = %err, "database health check task failed");
            false
        }
    };

    let guard = ctx.booking.guard();
    let calendar = guard.calendar_breaker().metrics();
    let mail = guard.mail_breaker().metrics();

    let result = Ok(HealthReport {
        database_ok,
        calendar_circuit: calendar.state.to_string(),
        mail_circuit: mail.state.to_string(),
        rejected_calls: calendar.rejected_calls + mail.rejected_calls,
    });

    log_command_result(command_name, start, &result);
    result
}
