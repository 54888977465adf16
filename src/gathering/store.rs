//! Session store: the identifier-keyed map of live gatherings
//!
//! The store is plain data; the manager owns it behind a single lock so every
//! operation here runs inside that exclusion domain.

use crate::error::{RendezvousError, Result};
use crate::gathering::instance::GatheringSession;
use crate::types::{GatheringId, INVALID_GATHERING_ID};
use std::collections::HashMap;

/// Owner of every live gathering session
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: HashMap<GatheringId, GatheringSession>,
    /// Highest identifier that may be handed out
    max_id: GatheringId,
}

impl SessionStore {
    /// Create an empty store covering the full identifier space
    pub fn new() -> Self {
        Self::with_id_limit(GatheringId::MAX)
    }

    /// Create an empty store that allocates identifiers in `1..=max_id`
    pub fn with_id_limit(max_id: GatheringId) -> Self {
        Self {
            sessions: HashMap::new(),
            max_id,
        }
    }

    /// First identifier, counting up from 1, that is not a live key
    pub fn allocate_id(&self) -> Result<GatheringId> {
        (1..=self.max_id)
            .find(|id| !self.sessions.contains_key(id))
            .ok_or_else(|| RendezvousError::NoGatheringsAvailable.into())
    }

    /// Insert a session under `id`, replacing nothing
    pub fn insert(&mut self, id: GatheringId, session: GatheringSession) -> Result<()> {
        if id == INVALID_GATHERING_ID {
            return Err(RendezvousError::InternalError {
                message: "gathering ID 0 cannot be stored".to_string(),
            }
            .into());
        }
        if self.sessions.contains_key(&id) {
            return Err(RendezvousError::InternalError {
                message: format!("gathering {} already exists", id),
            }
            .into());
        }

        self.sessions.insert(id, session);
        Ok(())
    }

    pub fn get(&self, id: GatheringId) -> Option<&GatheringSession> {
        self.sessions.get(&id)
    }

    pub fn get_mut(&mut self, id: GatheringId) -> Option<&mut GatheringSession> {
        self.sessions.get_mut(&id)
    }

    /// Like `get`, but absence is an error
    pub fn require(&self, id: GatheringId) -> Result<&GatheringSession> {
        self.sessions
            .get(&id)
            .ok_or_else(|| not_found(id))
    }

    /// Like `get_mut`, but absence is an error
    pub fn require_mut(&mut self, id: GatheringId) -> Result<&mut GatheringSession> {
        self.sessions
            .get_mut(&id)
            .ok_or_else(|| not_found(id))
    }

    pub fn remove(&mut self, id: GatheringId) -> Option<GatheringSession> {
        self.sessions.remove(&id)
    }

    pub fn contains(&self, id: GatheringId) -> bool {
        self.sessions.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Iterate live sessions in unspecified order
    pub fn iter(&self) -> impl Iterator<Item = (GatheringId, &GatheringSession)> {
        self.sessions.iter().map(|(id, session)| (*id, session))
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

fn not_found(id: GatheringId) -> anyhow::Error {
    RendezvousError::NotFound {
        what: format!("gathering {}", id),
    }
    .into()
}
