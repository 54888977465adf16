//! Notification event definitions

use crate::types::{GatheringId, Pid};
use serde::{Deserialize, Serialize};

/// Notification categories understood by game clients
pub mod categories {
    pub const PARTICIPATION: u32 = 3;
}

/// Subtypes of the participation category
pub mod participation {
    pub const NEW_PARTICIPANT: u32 = 1;
}

/// Combine a category and subtype into the wire notification type
pub fn build_notification_type(category: u32, subtype: u32) -> u32 {
    category * 1000 + subtype
}

/// Event handed to the notification collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEvent {
    /// Identity the event is reported as coming from
    pub pid_source: Pid,
    pub notification_type: u32,
    pub param1: u32,
    pub param2: u32,
    pub str_param: String,
}

impl NotificationEvent {
    /// `requester` joined `gathering_id`, reported on behalf of its owner
    pub fn new_participant(
        owner: Pid,
        gathering_id: GatheringId,
        requester: Pid,
        message: impl Into<String>,
    ) -> Self {
        Self {
            pid_source: owner,
            notification_type: build_notification_type(
                categories::PARTICIPATION,
                participation::NEW_PARTICIPANT,
            ),
            param1: gathering_id,
            param2: requester,
            str_param: message.into(),
        }
    }

    pub fn category(&self) -> u32 {
        self.notification_type / 1000
    }

    pub fn subtype(&self) -> u32 {
        self.notification_type % 1000
    }

    pub fn is_new_participant(&self) -> bool {
        self.category() == categories::PARTICIPATION
            && self.subtype() == participation::NEW_PARTICIPANT
    }
}
