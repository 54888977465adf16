//! Common types used throughout the rendezvous service

use crate::error::{RendezvousError, Result, ResultCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Registry key of a gathering; `0` is never assigned
pub type GatheringId = u32;

/// Transport connection identifier
pub type ConnectionId = u32;

/// Persistent player identity
pub type Pid = u32;

/// Never assigned to a gathering
pub const INVALID_GATHERING_ID: GatheringId = 0;

/// The client a request came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Requester {
    pub connection_id: ConnectionId,
    pub pid: Pid,
}

impl Requester {
    pub fn new(connection_id: ConnectionId, pid: Pid) -> Self {
        Self { connection_id, pid }
    }
}

/// Base gathering description shared by every gathering kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gathering {
    pub id: GatheringId,
    pub owner_pid: Pid,
    pub host_pid: Pid,
    pub minimum_participants: u16,
    pub maximum_participants: u16,
    pub participation_policy: u32,
    pub policy_argument: u32,
    pub flags: u32,
    pub state: u32,
    pub description: String,
}

/// Game-visible matchmaking session state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchmakeSession {
    pub gathering: Gathering,
    pub game_mode: u32,
    pub attributes: Vec<u32>,
    pub open_participation: bool,
    pub matchmake_system_type: u32,
    pub application_buffer: Vec<u8>,
    pub participation_count: u32,
    pub progress_score: u8,
    pub session_key: Vec<u8>,
    pub option: u32,
    pub user_password: String,
    pub started_time: Option<DateTime<Utc>>,
}

impl MatchmakeSession {
    pub fn id(&self) -> GatheringId {
        self.gathering.id
    }

    pub fn owner_pid(&self) -> Pid {
        self.gathering.owner_pid
    }

    pub fn host_pid(&self) -> Pid {
        self.gathering.host_pid
    }

    pub fn maximum_participants(&self) -> usize {
        self.gathering.maximum_participants as usize
    }
}

/// One entry of a criteria-based search request
///
/// Values are kept as the game sends them (ranges and attributes are encoded
/// as strings); equality is field-by-field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchmakeSessionSearchCriteria {
    pub attribs: Vec<String>,
    pub game_mode: String,
    pub minimum_participants: String,
    pub maximum_participants: String,
    pub matchmake_system_type: String,
    pub vacant_only: bool,
    pub exclude_locked: bool,
    pub exclude_non_host_pid: bool,
    pub selection_method: u32,
    pub vacant_participants: u16,
}

/// Tagged gathering payload as carried by the remote-call layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type_name", content = "object_data")]
pub enum AnyGathering {
    MatchmakeSession(MatchmakeSession),
    PersistentGathering(Gathering),
    Gathering(Gathering),
}

impl AnyGathering {
    /// Name of the carried data type
    pub fn type_name(&self) -> &'static str {
        match self {
            AnyGathering::MatchmakeSession(_) => "MatchmakeSession",
            AnyGathering::PersistentGathering(_) => "PersistentGathering",
            AnyGathering::Gathering(_) => "Gathering",
        }
    }

    /// Extract the matchmake session, rejecting any other payload kind
    pub fn into_matchmake_session(self) -> Result<MatchmakeSession> {
        match self {
            AnyGathering::MatchmakeSession(session) => Ok(session),
            other => Err(RendezvousError::InvalidArgument {
                reason: format!("expected MatchmakeSession, got {}", other.type_name()),
            }
            .into()),
        }
    }

    /// Decode a payload from JSON bytes
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| {
            RendezvousError::InvalidArgument {
                reason: format!("Failed to decode gathering: {}", e),
            }
            .into()
        })
    }
}

/// Parameters of the auto-matchmake-with-param call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoMatchmakeParam {
    pub source_matchmake_session: MatchmakeSession,
    pub search_criteria: Vec<MatchmakeSessionSearchCriteria>,
    pub join_message: String,
}

/// Response shape handed back to the remote-call layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchmakeResponse {
    pub session: Option<MatchmakeSession>,
    pub code: ResultCode,
}

impl MatchmakeResponse {
    pub fn from_result(result: Result<MatchmakeSession>) -> Self {
        match result {
            Ok(session) => Self {
                session: Some(session),
                code: ResultCode::Success,
            },
            Err(e) => Self {
                session: None,
                code: crate::error::result_code(&e),
            },
        }
    }
}
