//! # Rendezvous Core
//!
//! Scheduling and booking logic - no infrastructure dependencies.
//!
//! This crate contains:
//! - The availability calculator and booking orchestrator
//! - Port interfaces (traits) for storage, calendar and mail
//! - The guarded external call path (retry plus circuit breakers)
//!
//! ## Architecture Principles
//! - Only depends on `rendezvous-common` and `rendezvous-domain`
//! - No database or HTTP code
//! - All external dependencies via traits

pub mod scheduling;

pub use scheduling::{
    AvailabilityService, AvailabilityStore, BlacklistStore, BookingPorts, BookingService,
    CalendarClient, ExternalCallGuard, MailClient, NotificationLog, ReservationStore, SharedClock,
};
