//! SQLite implementations of the storage ports

pub mod blacklist_repository;
mod codec;
pub mod manager;
pub mod notification_repository;
pub mod reservation_repository;

pub use blacklist_repository::SqliteBlacklistStore;
pub use manager::{DbManager, SqliteConnection};
pub use notification_repository::SqliteNotificationLog;
pub use reservation_repository::SqliteReservationStore;
