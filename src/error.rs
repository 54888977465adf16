//! Error types for the rendezvous service
//!
//! Fallible operations return `anyhow::Result`; the typed variants below are
//! converted with `.into()` and recovered by the dispatch layer through
//! [`result_code`].

use crate::types::{ConnectionId, GatheringId};

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific matchmaking scenarios
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RendezvousError {
    #[error("Invalid argument: {reason}")]
    InvalidArgument { reason: String },

    #[error("Gathering {gathering_id} is full")]
    GatheringFull { gathering_id: GatheringId },

    #[error("Connection ID {connection_id} is already in gathering {gathering_id}")]
    AlreadyParticipating {
        connection_id: ConnectionId,
        gathering_id: GatheringId,
    },

    #[error("No gatherings available")]
    NoGatheringsAvailable,

    #[error("Missing required capability: {capability}")]
    ConfigurationMissing { capability: String },

    #[error("Not found: {what}")]
    NotFound { what: String },

    #[error("Permission denied: {reason}")]
    PermissionDenied { reason: String },

    #[error("Internal service error: {message}")]
    InternalError { message: String },
}

/// Result codes reported back through the remote-call layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ResultCode {
    Success,
    InvalidArgument,
    Exception,
    SessionFull,
    AlreadyParticipatedGathering,
    LimitExceeded,
    NotFound,
    PermissionDenied,
}

impl RendezvousError {
    /// Result code the caller should receive for this error
    pub fn code(&self) -> ResultCode {
        match self {
            RendezvousError::InvalidArgument { .. } => ResultCode::InvalidArgument,
            RendezvousError::GatheringFull { .. } => ResultCode::SessionFull,
            RendezvousError::AlreadyParticipating { .. } => {
                ResultCode::AlreadyParticipatedGathering
            }
            RendezvousError::NoGatheringsAvailable => ResultCode::LimitExceeded,
            RendezvousError::ConfigurationMissing { .. } => ResultCode::Exception,
            RendezvousError::NotFound { .. } => ResultCode::NotFound,
            RendezvousError::PermissionDenied { .. } => ResultCode::PermissionDenied,
            RendezvousError::InternalError { .. } => ResultCode::Exception,
        }
    }
}

/// Map any error to a result code; errors not raised by this crate are exceptions
pub fn result_code(error: &anyhow::Error) -> ResultCode {
    error
        .downcast_ref::<RendezvousError>()
        .map(RendezvousError::code)
        .unwrap_or(ResultCode::Exception)
}
