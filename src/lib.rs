//! Rendezvous Room - session matchmaking core
//!
//! This crate keeps a registry of game gatherings, matches clients into them
//! by template or by search criteria, creates new gatherings when nothing
//! fits and notifies owners when participants join.

pub mod config;
pub mod error;
pub mod gathering;
pub mod metrics;
pub mod notification;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{RendezvousError, Result, ResultCode};
pub use types::*;

// Re-export key components
pub use gathering::{GatheringManager, MatchmakeRules, SessionStore, StandardMatchmakeRules};
pub use notification::{ConnectionDirectory, NotificationDispatcher, NotificationEvent};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
