//! # Rendezvous Infrastructure
//!
//! Implementations of the scheduling ports defined in `rendezvous-core`:
//! - SQLite repositories for reservations, blackouts, the blacklist and the
//!   notification log
//! - Google Calendar and Gmail adapters over a shared HTTP client
//! - Configuration loading from the environment or a TOML/JSON file
//!
//! All I/O lives here; the core crate stays pure.

pub mod config;
pub mod database;
pub mod errors;
pub mod http;
pub mod integrations;

pub use database::*;
pub use errors::{status_error, InfraError};
pub use http::{HttpClient, HttpClientBuilder};
pub use integrations::*;
