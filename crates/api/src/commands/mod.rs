//! Commands - the operations the binary exposes
//!
//! Each command times itself and reports through
//! [`log_command_result`](crate::utils::logging::log_command_result).

mod admin;
mod availability;
mod booking;
mod health;

pub use admin::*;
pub use availability::*;
pub use booking::*;
pub use health::*;
