//! Notification plumbing for membership changes
//!
//! This module defines the events the core emits and the capabilities it
//! uses to address and deliver them.

pub mod dispatcher;
pub mod events;

pub use dispatcher::{
    ChannelNotificationDispatcher, ConnectionDirectory, InMemoryConnectionDirectory,
    LoggingNotificationDispatcher, MockNotificationDispatcher, NotificationDispatcher,
};
pub use events::NotificationEvent;
