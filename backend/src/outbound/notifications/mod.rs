//! Notification handler adapters.

mod logging;

pub use logging::LoggingNotificationHandler;
