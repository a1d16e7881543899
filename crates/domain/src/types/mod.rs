//! Domain types and models

pub mod availability;
pub mod blacklist;
pub mod integration;
pub mod notification;
pub mod reservation;
pub mod window;

pub use availability::{AvailabilityDay, AvailabilityQuery, AvailabilitySlot, AvailabilityResponse};
pub use blacklist::{BlacklistEntry, Blackout};
pub use integration::{CalendarEventRequest, CreatedEvent, MailMessage};
pub use notification::{MeetingNotification, NewNotification, NotificationKind, NotificationStatus};
pub use reservation::{
    BookingRequest, BookingResult, MeetingReservation, NewReservation, ReservationStatus,
};
pub use window::{TimeWindow, WindowSource};
