use std::time::Instant;

use rendezvous_domain::{AvailabilityQuery, AvailabilityResponse, Result};

use crate::context::AppContext;
use crate::utils::logging::log_command_result;

/// Free slots over the requested horizon
///
/// Busy-time read failures degrade to the remaining sources, so this only
/// fails on configuration problems.
pub async fn get_availability(
    ctx: &AppContext,
    query: AvailabilityQuery,
) -> Result<AvailabilityResponse> {
    let command_name = "availability::get_availability";
    let start = Instant::now();

    let result = ctx.availability.get_availability(&ctx.cancellation_token(), query).await;

    log_command_result(command_name, start, &result);
    result
}
