//! Google Calendar and Gmail adapters

mod auth;
mod calendar;
mod gmail;
mod types;

pub use auth::GoogleTokenProvider;
pub use calendar::GoogleCalendarClient;
pub use gmail::GmailClient;
