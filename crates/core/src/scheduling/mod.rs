//! Scheduling engine
//!
//! Availability rendering, booking orchestration and the ports both depend
//! on.

pub mod availability;
pub mod booking;
pub mod guard;
pub mod lookup;
pub mod messages;
pub mod ports;
pub mod windows;

pub use availability::{local_hour_to_utc, slot_id, AvailabilityService};
pub use booking::{BookingPorts, BookingService};
pub use guard::{into_domain_error, AuthorizationAwarePolicy, ExternalCallGuard, SharedClock};
pub use lookup::lookup_hash;
pub use ports::{
    AvailabilityStore, BlacklistStore, CalendarClient, MailClient, NotificationLog,
    ReservationStore,
};
pub use windows::{expand_and_merge, overlaps};
